use salix_core::node_prelude::*;

/// Task that dispatches `"name args"` to the host's event sink on its first
/// tick and succeeds.
#[derive(Debug, Default)]
pub struct FireEventTask {
    pub name: String,
    pub args: String,
}

impl Task for FireEventTask {
    fn static_kind() -> &'static str {
        "TaskFireEvent"
    }

    fn kind(&self) -> &'static str {
        Self::static_kind()
    }

    fn tick(&mut self, ctx: &mut TickCtx) -> TaskStatus {
        ctx.rt.events.fire(&format!("{} {}", self.name, self.args));
        TaskStatus::Success
    }

    fn save_body(&self, w: &mut Encoder) {
        w.write_str(&self.name);
        w.write_str(&self.args);
    }

    fn load_body(&mut self, r: &mut Decoder<'_>) -> Result<(), WireError> {
        self.name = r.read_str()?;
        self.args = r.read_str()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Harness;
    use salix_core::{Context, Node, NodeKind, Registry};

    #[test]
    fn dispatches_the_command_line() {
        let registry = Registry::new();
        let mut h = Harness::new();
        let mut ctx = Context::new();
        let task = ctx.add_node(Node::new(
            NodeKind::Task(Box::new(FireEventTask {
                name: "Explode".to_owned(),
                args: "radius=2".to_owned(),
            })),
            "event",
        ));
        ctx.add_child(Context::ROOT, task).unwrap();

        assert_eq!(ctx.execute(&registry, &mut h.runtime(0.1)), ExecResult::Success);
        assert_eq!(h.events.fired, vec!["Explode radius=2".to_owned()]);
    }
}
