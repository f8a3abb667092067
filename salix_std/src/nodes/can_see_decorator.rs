use salix_core::node_prelude::*;

/// Line-of-sight gate against the actor referenced by a blackboard key.
///
/// The target is visible when it is within `range`, within `angle` degrees
/// of the owner's facing, and, with `raycast` set, the eye-to-eye ray does
/// not hit a block. A missing entry or actor is never visible, regardless
/// of `reverse`.
#[derive(Debug)]
pub struct CanSeeDecorator {
    pub key: String,
    /// Half-cone in degrees.
    pub angle: f32,
    pub range: f32,
    pub raycast: bool,
    pub reverse: bool,
}

impl Default for CanSeeDecorator {
    fn default() -> Self {
        CanSeeDecorator {
            key: String::new(),
            angle: 90.0,
            range: 10.0,
            raycast: false,
            reverse: false,
        }
    }
}

impl CanSeeDecorator {
    const FLAG_REVERSE: u8 = 1 << 0;
    const FLAG_RAYCAST: u8 = 1 << 1;

    pub fn new(key: impl Into<String>, angle: f32, range: f32) -> Self {
        CanSeeDecorator {
            key: key.into(),
            angle,
            range,
            ..Default::default()
        }
    }
}

impl Decorator for CanSeeDecorator {
    fn static_kind() -> &'static str {
        "DecoCanSee"
    }

    fn kind(&self) -> &'static str {
        Self::static_kind()
    }

    fn check(&mut self, ctx: &mut TickCtx) -> bool {
        let target = match ctx.find(&self.key) {
            Some(value) => value.as_actor(),
            None => return false,
        };
        if !target.is_valid() {
            return false;
        }
        let (owner_position, owner_eye, forward) = match ctx.rt.world.actor(ctx.rt.actor) {
            Some(owner) => (owner.position(), owner.eye_position(), owner.forward()),
            None => return false,
        };
        let (target_position, target_eye) = match ctx.rt.world.actor(target) {
            Some(actor) => (actor.position(), actor.eye_position()),
            None => return false,
        };

        let mut seen = owner_position.distance_squared(target_position) <= self.range * self.range;
        if seen {
            let to_target = (target_eye - owner_eye).normalize_or_zero();
            seen = forward.angle_between(to_target).to_degrees() < self.angle;
        }
        if seen && self.raycast {
            seen = !ctx
                .rt
                .world
                .raycast_vs_tiles(owner_eye, target_eye)
                .hit_block;
        }
        seen ^ self.reverse
    }

    fn save_body(&self, w: &mut Encoder) {
        w.write_str(&self.key);
        w.write_f32(self.angle);
        w.write_f32(self.range);
        let mut flags = 0u8;
        if self.reverse {
            flags |= Self::FLAG_REVERSE;
        }
        if self.raycast {
            flags |= Self::FLAG_RAYCAST;
        }
        w.write_u8(flags);
    }

    fn load_body(&mut self, r: &mut Decoder<'_>) -> Result<(), WireError> {
        self.key = r.read_str()?;
        self.angle = r.read_f32()?;
        self.range = r.read_f32()?;
        let flags = r.read_u8()?;
        self.reverse = flags & Self::FLAG_REVERSE != 0;
        self.raycast = flags & Self::FLAG_RAYCAST != 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{Harness, TestActor};
    use salix_core::{ActorUid, Context, DataHandle, DataType, Node, NodeKind, Registry};

    fn build(gate: CanSeeDecorator) -> (Context, Registry, DataHandle) {
        let mut registry = Registry::new();
        let handle = registry.register("Prey", DataType::Actor).unwrap();
        let mut ctx = Context::new();
        let task = ctx.add_node(Node::new(
            NodeKind::Task(Box::new(salix_core::nodes::DummyTask::new(
                ExecResult::Success,
            ))),
            "act",
        ));
        ctx.add_child(Context::ROOT, task).unwrap();
        ctx.add_decorator(task, salix_core::AttachedDecorator::new(Box::new(gate)))
            .unwrap();
        (ctx, registry, handle)
    }

    fn harness_with_prey(prey_at: Vec3) -> (Harness, ActorUid) {
        let mut h = Harness::with_self_actor(Vec3::ZERO);
        let prey = ActorUid::new(2, 1);
        h.world.actors.insert(prey.raw(), TestActor::at(prey_at));
        (h, prey)
    }

    #[test]
    fn sees_a_target_in_the_cone() {
        let (ctx, registry, handle) = build(CanSeeDecorator::new("Prey", 45.0, 5.0));
        let (mut h, prey) = harness_with_prey(Vec3::new(3.0, 0.0, 0.0));
        ctx.table_mut().set(&registry, handle).unwrap().set_actor(prey);

        assert_eq!(ctx.execute(&registry, &mut h.runtime(0.1)), ExecResult::Success);
    }

    #[test]
    fn range_and_cone_both_bound_visibility() {
        // Too far.
        let (ctx, registry, handle) = build(CanSeeDecorator::new("Prey", 45.0, 2.0));
        let (mut h, prey) = harness_with_prey(Vec3::new(3.0, 0.0, 0.0));
        ctx.table_mut().set(&registry, handle).unwrap().set_actor(prey);
        assert_eq!(ctx.execute(&registry, &mut h.runtime(0.1)), ExecResult::Failed);

        // Behind the owner (facing +x).
        let (ctx, registry, handle) = build(CanSeeDecorator::new("Prey", 45.0, 5.0));
        let (mut h, prey) = harness_with_prey(Vec3::new(-3.0, 0.0, 0.0));
        ctx.table_mut().set(&registry, handle).unwrap().set_actor(prey);
        assert_eq!(ctx.execute(&registry, &mut h.runtime(0.1)), ExecResult::Failed);
    }

    #[test]
    fn raycast_blocks_sight() {
        let mut gate = CanSeeDecorator::new("Prey", 45.0, 5.0);
        gate.raycast = true;
        let (ctx, registry, handle) = build(gate);
        let (mut h, prey) = harness_with_prey(Vec3::new(3.0, 0.0, 0.0));
        h.world.ray_hits = vec![true];
        ctx.table_mut().set(&registry, handle).unwrap().set_actor(prey);

        assert_eq!(ctx.execute(&registry, &mut h.runtime(0.1)), ExecResult::Failed);
        assert_eq!(h.world.ray_calls.get(), 1);
    }

    #[test]
    fn missing_target_is_false_even_reversed() {
        let mut gate = CanSeeDecorator::new("Prey", 45.0, 5.0);
        gate.reverse = true;
        let (ctx, registry, _) = build(gate);
        let mut h = Harness::with_self_actor(Vec3::ZERO);

        // The entry does not exist at all: no reverse applies.
        assert_eq!(ctx.execute(&registry, &mut h.runtime(0.1)), ExecResult::Failed);
    }

    #[test]
    fn reverse_inverts_a_resolved_test() {
        let mut gate = CanSeeDecorator::new("Prey", 45.0, 5.0);
        gate.reverse = true;
        let (ctx, registry, handle) = build(gate);
        let (mut h, prey) = harness_with_prey(Vec3::new(3.0, 0.0, 0.0));
        ctx.table_mut().set(&registry, handle).unwrap().set_actor(prey);

        assert_eq!(ctx.execute(&registry, &mut h.runtime(0.1)), ExecResult::Failed);
    }
}
