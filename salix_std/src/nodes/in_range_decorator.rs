use salix_core::node_prelude::*;

use super::resolve_position;

/// Distance gate against a blackboard target, either an actor reference or
/// a plain vector. A missing target is out of range regardless of
/// `reverse`.
#[derive(Debug, Default)]
pub struct IsInRangeDecorator {
    pub key: String,
    pub range: f32,
    pub reverse: bool,
}

impl IsInRangeDecorator {
    pub fn new(key: impl Into<String>, range: f32) -> Self {
        IsInRangeDecorator {
            key: key.into(),
            range,
            reverse: false,
        }
    }
}

impl Decorator for IsInRangeDecorator {
    fn static_kind() -> &'static str {
        "DecoInRange"
    }

    fn kind(&self) -> &'static str {
        Self::static_kind()
    }

    fn check(&mut self, ctx: &mut TickCtx) -> bool {
        let target = match resolve_position(ctx.find(&self.key), ctx) {
            Some(target) => target,
            None => return false,
        };
        let position = match ctx.rt.world.actor(ctx.rt.actor) {
            Some(owner) => owner.position(),
            None => return false,
        };
        (position.distance_squared(target) <= self.range * self.range) ^ self.reverse
    }

    fn save_body(&self, w: &mut Encoder) {
        w.write_str(&self.key);
        w.write_f32(self.range);
        w.write_bool(self.reverse);
    }

    fn load_body(&mut self, r: &mut Decoder<'_>) -> Result<(), WireError> {
        self.key = r.read_str()?;
        self.range = r.read_f32()?;
        self.reverse = r.read_bool()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{Harness, TestActor};
    use salix_core::{ActorUid, AttachedDecorator, Context, DataType, Node, NodeKind, Registry};

    fn build(gate: IsInRangeDecorator, key_type: DataType) -> (Context, Registry) {
        let mut registry = Registry::new();
        registry.register("Target", key_type).unwrap();
        let mut ctx = Context::new();
        let task = ctx.add_node(Node::new(
            NodeKind::Task(Box::new(salix_core::nodes::DummyTask::new(
                ExecResult::Success,
            ))),
            "act",
        ));
        ctx.add_child(Context::ROOT, task).unwrap();
        ctx.add_decorator(task, AttachedDecorator::new(Box::new(gate)))
            .unwrap();
        (ctx, registry)
    }

    #[test]
    fn vector_target_in_range() {
        let (ctx, registry) = build(IsInRangeDecorator::new("Target", 5.0), DataType::Vector);
        let mut h = Harness::with_self_actor(Vec3::ZERO);
        let handle = registry.handle_of("Target").unwrap();
        ctx.table_mut()
            .set(&registry, handle)
            .unwrap()
            .set_vector(Vec3::new(3.0, 4.0, 0.0));

        // Distance is exactly 5.
        assert_eq!(ctx.execute(&registry, &mut h.runtime(0.1)), ExecResult::Success);
    }

    #[test]
    fn actor_target_out_of_range() {
        let (ctx, registry) = build(IsInRangeDecorator::new("Target", 2.0), DataType::Actor);
        let mut h = Harness::with_self_actor(Vec3::ZERO);
        let other = ActorUid::new(2, 1);
        h.world
            .actors
            .insert(other.raw(), TestActor::at(Vec3::new(6.0, 0.0, 0.0)));
        let handle = registry.handle_of("Target").unwrap();
        ctx.table_mut().set(&registry, handle).unwrap().set_actor(other);

        assert_eq!(ctx.execute(&registry, &mut h.runtime(0.1)), ExecResult::Failed);
    }

    #[test]
    fn reverse_gates_on_being_far() {
        let mut gate = IsInRangeDecorator::new("Target", 2.0);
        gate.reverse = true;
        let (ctx, registry) = build(gate, DataType::Vector);
        let mut h = Harness::with_self_actor(Vec3::ZERO);
        let handle = registry.handle_of("Target").unwrap();
        ctx.table_mut()
            .set(&registry, handle)
            .unwrap()
            .set_vector(Vec3::new(9.0, 0.0, 0.0));

        assert_eq!(ctx.execute(&registry, &mut h.runtime(0.1)), ExecResult::Success);
    }

    #[test]
    fn missing_target_fails_even_reversed() {
        let mut gate = IsInRangeDecorator::new("Target", 2.0);
        gate.reverse = true;
        let (ctx, registry) = build(gate, DataType::Vector);
        let mut h = Harness::with_self_actor(Vec3::ZERO);

        assert_eq!(ctx.execute(&registry, &mut h.runtime(0.1)), ExecResult::Failed);
    }
}
