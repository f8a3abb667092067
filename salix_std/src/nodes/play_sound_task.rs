use salix_core::node_prelude::*;

/// Task that plays a 3-D sound at the acting actor's position and finishes
/// immediately.
#[derive(Debug)]
pub struct PlaySoundTask {
    pub sound: String,
    pub volume: f32,
    pub speed: f32,
}

impl Default for PlaySoundTask {
    fn default() -> Self {
        PlaySoundTask {
            sound: String::new(),
            volume: 1.0,
            speed: 1.0,
        }
    }
}

impl Task for PlaySoundTask {
    fn static_kind() -> &'static str {
        "TaskPlaySound"
    }

    fn kind(&self) -> &'static str {
        Self::static_kind()
    }

    fn tick(&mut self, ctx: &mut TickCtx) -> TaskStatus {
        let position = match ctx.rt.world.actor(ctx.rt.actor) {
            Some(actor) => actor.position(),
            None => return TaskStatus::Failure,
        };
        ctx.rt
            .audio
            .play_at(&self.sound, position, self.volume, self.speed);
        TaskStatus::Success
    }

    fn save_body(&self, w: &mut Encoder) {
        w.write_str(&self.sound);
        w.write_f32(self.volume);
        w.write_f32(self.speed);
    }

    fn load_body(&mut self, r: &mut Decoder<'_>) -> Result<(), WireError> {
        self.sound = r.read_str()?;
        self.volume = r.read_f32()?;
        self.speed = r.read_f32()?;
        Ok(())
    }
}
