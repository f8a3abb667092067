use salix_core::node_prelude::*;

/// Task that applies damage to the actor referenced by a blackboard key.
///
/// Fails when the key does not resolve to a living, health-bearing actor;
/// a kill is tallied on the controller when the victim reads dead after the
/// hit.
#[derive(Debug, Default)]
pub struct AttackTask {
    pub key: String,
    pub damage: f32,
}

impl AttackTask {
    pub fn new(key: impl Into<String>, damage: f32) -> Self {
        AttackTask {
            key: key.into(),
            damage,
        }
    }
}

impl Task for AttackTask {
    fn static_kind() -> &'static str {
        "TaskAttack"
    }

    fn kind(&self) -> &'static str {
        Self::static_kind()
    }

    fn tick(&mut self, ctx: &mut TickCtx) -> TaskStatus {
        let target = match ctx.find(&self.key) {
            Some(value) => value.as_actor(),
            None => return TaskStatus::Failure,
        };
        if !target.is_valid() || ctx.rt.world.actor(target).is_none() {
            return TaskStatus::Failure;
        }
        if !ctx.rt.health.damage(target, self.damage) {
            return TaskStatus::Failure;
        }
        let died = ctx
            .rt
            .world
            .actor(target)
            .map(|a| a.is_dead())
            .unwrap_or(false);
        if died {
            ctx.rt.controller.record_kill();
        }
        TaskStatus::Success
    }

    fn save_body(&self, w: &mut Encoder) {
        w.write_f32(self.damage);
        w.write_str(&self.key);
    }

    fn load_body(&mut self, r: &mut Decoder<'_>) -> Result<(), WireError> {
        self.damage = r.read_f32()?;
        self.key = r.read_str()?;
        Ok(())
    }
}
