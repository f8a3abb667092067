use salix_core::node_prelude::*;

use super::resolve_position;

/// Task that steers the actor to a blackboard target.
///
/// The key may hold a vector or an actor reference; anything else fails.
/// The move request is issued once, after which the task polls the
/// controller and succeeds when the motion ends, regardless of how close
/// the controller got (the arrival radius is advisory and travels with the
/// request for the host's benefit).
#[derive(Debug, Default)]
pub struct MoveToTask {
    pub key: String,
    pub radius: f32,
    moving: bool,
}

impl MoveToTask {
    pub fn new(key: impl Into<String>, radius: f32) -> Self {
        MoveToTask {
            key: key.into(),
            radius,
            moving: false,
        }
    }
}

impl Task for MoveToTask {
    fn static_kind() -> &'static str {
        "TaskMoveTo"
    }

    fn kind(&self) -> &'static str {
        Self::static_kind()
    }

    fn reset(&mut self) {
        self.moving = false;
    }

    fn tick(&mut self, ctx: &mut TickCtx) -> TaskStatus {
        if !self.moving {
            let target = match resolve_position(ctx.find(&self.key), ctx) {
                Some(target) => target,
                None => {
                    tracing::debug!(key = %self.key, "move target did not resolve");
                    return TaskStatus::Failure;
                }
            };
            ctx.rt.controller.move_to(target);
            self.moving = true;
            return TaskStatus::Running;
        }
        if ctx.rt.controller.is_moving() {
            TaskStatus::Running
        } else {
            TaskStatus::Success
        }
    }

    fn on_abort(&mut self, ctx: &mut TickCtx) {
        if self.moving {
            ctx.rt.controller.stop_moving();
            self.moving = false;
        }
    }

    fn save_body(&self, w: &mut Encoder) {
        w.write_f32(self.radius);
        w.write_str(&self.key);
    }

    fn load_body(&mut self, r: &mut Decoder<'_>) -> Result<(), WireError> {
        self.radius = r.read_f32()?;
        self.key = r.read_str()?;
        Ok(())
    }
}
