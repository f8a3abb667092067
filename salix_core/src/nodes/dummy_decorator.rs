use crate::node_prelude::*;

/// Decorator with a fixed condition, flip `should_pass` from a test to
/// drive edges.
#[derive(Debug, Default)]
pub struct DummyDecorator {
    pub should_pass: bool,
}

impl DummyDecorator {
    pub fn new(should_pass: bool) -> Self {
        DummyDecorator { should_pass }
    }
}

impl Decorator for DummyDecorator {
    fn static_kind() -> &'static str {
        "DecoDummy"
    }

    fn kind(&self) -> &'static str {
        Self::static_kind()
    }

    fn check(&mut self, _ctx: &mut TickCtx) -> bool {
        self.should_pass
    }

    fn save_body(&self, w: &mut Encoder) {
        w.write_bool(self.should_pass);
    }

    fn load_body(&mut self, r: &mut Decoder<'_>) -> Result<(), WireError> {
        self.should_pass = r.read_bool()?;
        Ok(())
    }
}
