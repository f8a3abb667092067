use salix_core::node_prelude::*;

/// Gate that locks its owner out for `duration` seconds after a success.
///
/// The stopwatch starts when the owner finishes with
/// [`ExecResult::Success`]; while it runs and has not yet elapsed the
/// condition is false.
#[derive(Debug, Default)]
pub struct CooldownDecorator {
    pub duration: f32,
    watch: Stopwatch,
}

impl CooldownDecorator {
    pub fn new(duration: f32) -> Self {
        CooldownDecorator {
            duration,
            ..Default::default()
        }
    }
}

impl Decorator for CooldownDecorator {
    fn static_kind() -> &'static str {
        "DecoCooldown"
    }

    fn kind(&self) -> &'static str {
        Self::static_kind()
    }

    fn check(&mut self, ctx: &mut TickCtx) -> bool {
        self.watch.is_stopped() || self.watch.has_elapsed(ctx.rt.clock)
    }

    fn on_finished(&mut self, result: ExecResult, ctx: &mut TickCtx) {
        if result == ExecResult::Success {
            self.watch.start(ctx.rt.clock, self.duration as f64);
        }
    }

    fn save_body(&self, w: &mut Encoder) {
        w.write_f32(self.duration);
    }

    fn load_body(&mut self, r: &mut Decoder<'_>) -> Result<(), WireError> {
        self.duration = r.read_f32()?;
        Ok(())
    }
}
