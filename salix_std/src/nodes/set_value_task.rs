use salix_core::node_prelude::*;

/// Task that copies one blackboard entry onto another.
///
/// An unresolved source unsets the destination instead. A source whose tag
/// differs from the destination's registered type resets the destination to
/// that type's default. Always succeeds.
#[derive(Debug, Default)]
pub struct SetValueTask {
    pub key: String,
    pub from_key: String,
}

impl SetValueTask {
    pub fn new(key: impl Into<String>, from_key: impl Into<String>) -> Self {
        SetValueTask {
            key: key.into(),
            from_key: from_key.into(),
        }
    }
}

impl Task for SetValueTask {
    fn static_kind() -> &'static str {
        "TaskSetValue"
    }

    fn kind(&self) -> &'static str {
        Self::static_kind()
    }

    fn tick(&mut self, ctx: &mut TickCtx) -> TaskStatus {
        match ctx.find(&self.from_key).cloned() {
            None => ctx.unset(&self.key),
            Some(source) => {
                if let Some(destination) = ctx.set(&self.key) {
                    destination.assign(&source);
                }
            }
        }
        TaskStatus::Success
    }

    fn save_body(&self, w: &mut Encoder) {
        w.write_str(&self.key);
        w.write_str(&self.from_key);
    }

    fn load_body(&mut self, r: &mut Decoder<'_>) -> Result<(), WireError> {
        self.key = r.read_str()?;
        self.from_key = r.read_str()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Harness;
    use salix_core::{Context, DataType, Node, NodeKind, Registry};

    fn build(key: &str, from: &str) -> Context {
        let mut ctx = Context::new();
        let task = ctx.add_node(Node::new(
            NodeKind::Task(Box::new(SetValueTask::new(key, from))),
            "set value",
        ));
        ctx.add_child(Context::ROOT, task).unwrap();
        ctx
    }

    #[test]
    fn copies_between_entries() {
        let mut registry = Registry::new();
        let a = registry.register("A", DataType::Number).unwrap();
        let b = registry.register("B", DataType::Number).unwrap();
        let mut h = Harness::new();
        let ctx = build("B", "A");
        ctx.table_mut().set(&registry, a).unwrap().set_number(42.0);

        assert_eq!(ctx.execute(&registry, &mut h.runtime(0.1)), ExecResult::Success);
        assert_eq!(ctx.table().find(b).map(|v| v.as_number()), Some(42.0));
    }

    #[test]
    fn unresolved_source_unsets_the_destination() {
        let mut registry = Registry::new();
        let b = registry.register("B", DataType::Number).unwrap();
        let mut h = Harness::new();
        let ctx = build("B", "DoesNotExist");
        ctx.table_mut().set(&registry, b).unwrap().set_number(9.0);

        assert_eq!(ctx.execute(&registry, &mut h.runtime(0.1)), ExecResult::Success);
        assert!(ctx.table().find(b).is_none());
    }

    #[test]
    fn tag_mismatch_defaults_the_destination() {
        let mut registry = Registry::new();
        let a = registry.register("A", DataType::Text).unwrap();
        let b = registry.register("B", DataType::Number).unwrap();
        let mut h = Harness::new();
        let ctx = build("B", "A");
        ctx.table_mut().set(&registry, a).unwrap().set_text("nope");
        ctx.table_mut().set(&registry, b).unwrap().set_number(5.0);

        assert_eq!(ctx.execute(&registry, &mut h.runtime(0.1)), ExecResult::Success);
        assert_eq!(ctx.table().find(b).map(|v| v.as_number()), Some(0.0));
    }
}
