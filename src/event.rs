use tokio::sync::mpsc::UnboundedSender;

use crate::buffer::OutputLine;
use crate::command::RunId;
use crate::tail::{LogSnapshot, SnapshotSink};

/// Event from background tasks to the UI loop
#[derive(Debug)]
pub enum AppEvent {
    /// Log snapshot of a benchmarking run
    Snapshot { run_id: RunId, snapshot: LogSnapshot },
    /// Sent after the run's final snapshot
    RunFinished { run_id: RunId, exit_code: i32 },
    /// Output line of the setup command
    SetupOutput(OutputLine),
    SetupFinished { exit_code: i32 },
    SetupFailed { reason: String },
}

/// Tags snapshots with their run before handing them to the UI loop
pub struct RunEvents {
    run_id: RunId,
    tx: UnboundedSender<AppEvent>,
}

impl RunEvents {
    pub fn new(run_id: RunId, tx: UnboundedSender<AppEvent>) -> Self {
        Self { run_id, tx }
    }
}

impl SnapshotSink for RunEvents {
    fn push(&mut self, snapshot: LogSnapshot) {
        let _ = self.tx.send(AppEvent::Snapshot {
            run_id: self.run_id,
            snapshot,
        });
    }
}
