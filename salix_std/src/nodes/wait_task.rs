use salix_core::node_prelude::*;

/// Task that stays running until `time` seconds of clock time have passed.
///
/// The stopwatch starts on the first tick after entry and is stopped again
/// when the node is aborted, so a preempted wait starts over.
#[derive(Debug, Default)]
pub struct WaitTask {
    pub time: f32,
    watch: Stopwatch,
}

impl WaitTask {
    pub fn new(time: f32) -> Self {
        WaitTask {
            time,
            ..Default::default()
        }
    }
}

impl Task for WaitTask {
    fn static_kind() -> &'static str {
        "TaskWait"
    }

    fn kind(&self) -> &'static str {
        Self::static_kind()
    }

    fn reset(&mut self) {
        self.watch.stop();
    }

    fn tick(&mut self, ctx: &mut TickCtx) -> TaskStatus {
        if self.watch.is_stopped() {
            self.watch.start(ctx.rt.clock, self.time as f64);
        }
        if self.watch.has_elapsed(ctx.rt.clock) {
            self.watch.stop();
            TaskStatus::Success
        } else {
            TaskStatus::Running
        }
    }

    fn on_abort(&mut self, _ctx: &mut TickCtx) {
        self.watch.stop();
    }

    fn save_body(&self, w: &mut Encoder) {
        w.write_f32(self.time);
    }

    fn load_body(&mut self, r: &mut Decoder<'_>) -> Result<(), WireError> {
        self.time = r.read_f32()?;
        Ok(())
    }
}
