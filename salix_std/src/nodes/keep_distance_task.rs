use glam::Quat;
use salix_core::node_prelude::*;

use super::resolve_position;

/// Task that backs the actor off to `range` away from a blackboard target.
///
/// The escape direction starts directly away from the target; candidate
/// rays are swept at 0°, ±10°, … ±80° around it and the first ray that does
/// not hit a block wins. The move destination is always derived from the
/// positive-angle rotation, even when the clear ray was the negative one;
/// saved trees depend on that quirk, so it stays.
#[derive(Debug, Default)]
pub struct KeepDistanceTask {
    pub target_key: String,
    pub range: f32,
    moving: bool,
}

impl KeepDistanceTask {
    pub fn new(target_key: impl Into<String>, range: f32) -> Self {
        KeepDistanceTask {
            target_key: target_key.into(),
            range,
            moving: false,
        }
    }
}

impl Task for KeepDistanceTask {
    fn static_kind() -> &'static str {
        "TaskKeepDistance"
    }

    fn kind(&self) -> &'static str {
        Self::static_kind()
    }

    fn reset(&mut self) {
        self.moving = false;
    }

    fn tick(&mut self, ctx: &mut TickCtx) -> TaskStatus {
        if self.moving {
            return if ctx.rt.controller.is_moving() {
                TaskStatus::Running
            } else {
                TaskStatus::Success
            };
        }

        let target = match resolve_position(ctx.find(&self.target_key), ctx) {
            Some(target) => target,
            None => return TaskStatus::Failure,
        };
        let origin = match ctx.rt.world.actor(ctx.rt.actor) {
            Some(actor) => actor.position(),
            None => return TaskStatus::Failure,
        };
        let away = {
            let d = (origin - target).normalize_or_zero();
            if d == Vec3::ZERO {
                Vec3::X
            } else {
                d
            }
        };

        for step in 0..=8u32 {
            let degrees = 10.0 * step as f32;
            let destination =
                target + Quat::from_rotation_z(degrees.to_radians()) * away * self.range;
            for sign in [1.0f32, -1.0] {
                if step == 0 && sign < 0.0 {
                    continue;
                }
                let probe =
                    target + Quat::from_rotation_z((sign * degrees).to_radians()) * away * self.range;
                if !ctx.rt.world.raycast_vs_tiles(origin, probe).hit_block {
                    tracing::trace!(angle = sign * degrees, "keep distance ray clear");
                    ctx.rt.controller.move_to(destination);
                    self.moving = true;
                    return TaskStatus::Running;
                }
            }
        }
        TaskStatus::Failure
    }

    fn on_abort(&mut self, ctx: &mut TickCtx) {
        if self.moving {
            ctx.rt.controller.stop_moving();
            self.moving = false;
        }
    }

    fn save_body(&self, w: &mut Encoder) {
        w.write_f32(self.range);
        w.write_str(&self.target_key);
    }

    fn load_body(&mut self, r: &mut Decoder<'_>) -> Result<(), WireError> {
        self.range = r.read_f32()?;
        self.target_key = r.read_str()?;
        Ok(())
    }
}
