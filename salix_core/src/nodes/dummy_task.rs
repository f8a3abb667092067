use crate::node_prelude::*;

/// Task that immediately finishes with a configured result.
///
/// [`ExecResult::Unknown`] keeps the task running forever, which makes it a
/// convenient stand-in for a long-running behavior in tests. The tick and
/// abort counters are not persisted.
#[derive(Debug, Default)]
pub struct DummyTask {
    pub expect: ExecResult,
    pub ticks: u32,
    pub aborts: u32,
}

impl DummyTask {
    pub fn new(expect: ExecResult) -> Self {
        DummyTask {
            expect,
            ..Default::default()
        }
    }
}

impl Task for DummyTask {
    fn static_kind() -> &'static str {
        "TaskDummy"
    }

    fn kind(&self) -> &'static str {
        Self::static_kind()
    }

    fn tick(&mut self, _ctx: &mut TickCtx) -> TaskStatus {
        self.ticks += 1;
        match self.expect {
            ExecResult::Success => TaskStatus::Success,
            ExecResult::Failed => TaskStatus::Failure,
            ExecResult::Aborted => TaskStatus::Aborted,
            ExecResult::Unknown => TaskStatus::Running,
        }
    }

    fn on_abort(&mut self, _ctx: &mut TickCtx) {
        self.aborts += 1;
    }

    fn save_body(&self, w: &mut Encoder) {
        w.write_u8(self.expect as u8);
    }

    fn load_body(&mut self, r: &mut Decoder<'_>) -> Result<(), WireError> {
        self.expect = ExecResult::from_u8(r.read_u8()?);
        Ok(())
    }
}
