use salix_core::node_prelude::*;

/// Gate on a blackboard entry.
///
/// With `check_set` the condition is whether the entry exists at all;
/// otherwise the entry's text rendering is compared against `value`, a
/// missing entry reading as the empty string. `reverse` inverts either
/// test.
#[derive(Debug, Default)]
pub struct WatchValueDecorator {
    pub key: String,
    pub value: String,
    pub check_set: bool,
    pub reverse: bool,
}

impl WatchValueDecorator {
    /// Gate on the presence of `key`.
    pub fn when_set(key: impl Into<String>) -> Self {
        WatchValueDecorator {
            key: key.into(),
            check_set: true,
            ..Default::default()
        }
    }

    /// Gate on `key` reading as `value`.
    pub fn when_equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        WatchValueDecorator {
            key: key.into(),
            value: value.into(),
            ..Default::default()
        }
    }
}

impl Decorator for WatchValueDecorator {
    fn static_kind() -> &'static str {
        "DecoWatchValue"
    }

    fn kind(&self) -> &'static str {
        Self::static_kind()
    }

    fn check(&mut self, ctx: &mut TickCtx) -> bool {
        let entry = ctx.find(&self.key);
        let condition = if self.check_set {
            entry.is_some()
        } else {
            entry.map(|v| v.as_text()).unwrap_or("") == self.value
        };
        condition ^ self.reverse
    }

    fn save_body(&self, w: &mut Encoder) {
        w.write_bool(self.check_set);
        w.write_bool(self.reverse);
        w.write_str(&self.key);
        w.write_str(&self.value);
    }

    fn load_body(&mut self, r: &mut Decoder<'_>) -> Result<(), WireError> {
        self.check_set = r.read_bool()?;
        self.reverse = r.read_bool()?;
        self.key = r.read_str()?;
        self.value = r.read_str()?;
        Ok(())
    }
}
