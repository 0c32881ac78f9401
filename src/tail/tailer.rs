use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::command::{RunHandle, RunState};

/// Full content of the log file at one polling tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSnapshot {
    pub content: String,
    /// Set on the single snapshot taken after the exit was observed
    pub is_final: bool,
}

/// Destination for snapshots
pub trait SnapshotSink: Send {
    fn push(&mut self, snapshot: LogSnapshot);
}

impl<T> SnapshotSink for mpsc::UnboundedSender<T>
where
    T: From<LogSnapshot> + Send,
{
    fn push(&mut self, snapshot: LogSnapshot) {
        if self.send(snapshot.into()).is_err() {
            debug!("snapshot receiver dropped");
        }
    }
}

/// Re-reads a run's log on a fixed interval until the run exits
#[derive(Debug, Clone, Copy)]
pub struct LogTailer {
    interval: Duration,
}

impl LogTailer {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Push a non-final snapshot every tick while `handle` runs, then one
    /// final snapshot once the exit is observed. Returns the exit code.
    ///
    /// Read and poll errors are logged and the tick skipped.
    pub async fn tail<S>(&self, handle: &RunHandle, log_path: &Path, sink: &mut S) -> i32
    where
        S: SnapshotSink + ?Sized,
    {
        loop {
            match handle.poll() {
                Ok(RunState::Running) => match read_log(log_path).await {
                    Ok(content) => sink.push(LogSnapshot {
                        content,
                        is_final: false,
                    }),
                    Err(e) => {
                        warn!(run_id = handle.id(), error = %e, "log read failed, skipping tick")
                    }
                },
                Ok(RunState::Exited { exit_code }) => {
                    let content = read_log(log_path).await.unwrap_or_else(|e| {
                        warn!(run_id = handle.id(), error = %e, "final log read failed");
                        String::new()
                    });
                    sink.push(LogSnapshot {
                        content,
                        is_final: true,
                    });
                    return exit_code;
                }
                Err(e) => warn!(run_id = handle.id(), error = %e, "poll failed, retrying"),
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}

impl Default for LogTailer {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

/// Whole log from offset 0; a missing file reads as empty.
///
/// Decoded lossily so a multi-byte sequence cut by a concurrent write or a
/// terminated writer does not fail the read.
pub async fn read_log(path: &Path) -> std::io::Result<String> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e),
    }
}
