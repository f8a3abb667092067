use salix_core::node_prelude::*;

/// Task that emits an AI-sense noise at the acting actor's position.
#[derive(Debug)]
pub struct MakeNoiseTask {
    pub volume: f32,
}

impl Default for MakeNoiseTask {
    fn default() -> Self {
        MakeNoiseTask { volume: 1.0 }
    }
}

impl Task for MakeNoiseTask {
    fn static_kind() -> &'static str {
        "TaskMakeNoise"
    }

    fn kind(&self) -> &'static str {
        Self::static_kind()
    }

    fn tick(&mut self, ctx: &mut TickCtx) -> TaskStatus {
        let position = match ctx.rt.world.actor(ctx.rt.actor) {
            Some(actor) => actor.position(),
            None => return TaskStatus::Failure,
        };
        ctx.rt.world.make_noise(position, self.volume);
        TaskStatus::Success
    }

    fn save_body(&self, w: &mut Encoder) {
        w.write_f32(self.volume);
    }

    fn load_body(&mut self, r: &mut Decoder<'_>) -> Result<(), WireError> {
        self.volume = r.read_f32()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Harness;
    use salix_core::{Context, Node, NodeKind, Registry};

    #[test]
    fn emits_noise_at_the_actor() {
        let registry = Registry::new();
        let mut h = Harness::with_self_actor(Vec3::new(1.0, 2.0, 0.0));
        let mut ctx = Context::new();
        let task = ctx.add_node(Node::new(
            NodeKind::Task(Box::new(MakeNoiseTask { volume: 0.4 })),
            "noise",
        ));
        ctx.add_child(Context::ROOT, task).unwrap();

        assert_eq!(ctx.execute(&registry, &mut h.runtime(0.1)), ExecResult::Success);
        assert_eq!(h.world.noises, vec![(Vec3::new(1.0, 2.0, 0.0), 0.4)]);
    }

    #[test]
    fn fails_without_an_actor() {
        let registry = Registry::new();
        let mut h = Harness::new();
        let mut ctx = Context::new();
        let task = ctx.add_node(Node::new(
            NodeKind::Task(Box::new(MakeNoiseTask::default())),
            "noise",
        ));
        ctx.add_child(Context::ROOT, task).unwrap();

        assert_eq!(ctx.execute(&registry, &mut h.runtime(0.1)), ExecResult::Failed);
        assert!(h.world.noises.is_empty());
    }
}
