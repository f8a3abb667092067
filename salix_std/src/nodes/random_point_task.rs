use salix_core::node_prelude::*;

/// Task that samples a navigable point in a disc around the acting actor
/// and writes it to a blackboard vector key.
///
/// Samples are uniform over the disc. Points whose floor tile the nav mesh
/// rejects are re-rolled, up to 100 times before giving up.
#[derive(Debug, Default)]
pub struct RandomPointTask {
    pub target_key: String,
    pub range: f32,
}

impl RandomPointTask {
    const MAX_REJECTIONS: u32 = 100;

    pub fn new(target_key: impl Into<String>, range: f32) -> Self {
        RandomPointTask {
            target_key: target_key.into(),
            range,
        }
    }
}

impl Task for RandomPointTask {
    fn static_kind() -> &'static str {
        "TaskRandomPoint"
    }

    fn kind(&self) -> &'static str {
        Self::static_kind()
    }

    fn tick(&mut self, ctx: &mut TickCtx) -> TaskStatus {
        let center = match ctx.rt.world.actor(ctx.rt.actor) {
            Some(actor) => actor.position(),
            None => return TaskStatus::Failure,
        };
        for _ in 0..Self::MAX_REJECTIONS {
            let radius = self.range * ctx.rt.rng.uniform().sqrt();
            let angle = ctx.rt.rng.uniform() * std::f32::consts::TAU;
            let point = center + Vec3::new(radius * angle.cos(), radius * angle.sin(), 0.0);
            let tile = (point.x.floor() as i32, point.y.floor() as i32);
            if !ctx.rt.world.nav_accessible(tile, false) {
                continue;
            }
            return match ctx.set(&self.target_key) {
                Some(value) => {
                    value.set_vector(point);
                    TaskStatus::Success
                }
                None => TaskStatus::Failure,
            };
        }
        TaskStatus::Failure
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
