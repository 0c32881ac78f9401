use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::command::RunRequest;
use crate::error::{DashError, Result};

/// Monotonic identifier of a run within this process
pub type RunId = u64;

/// Observable lifecycle state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Exited { exit_code: i32 },
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running)
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            RunState::Running => None,
            RunState::Exited { exit_code } => Some(*exit_code),
        }
    }
}

/// Handle to a spawned external process.
///
/// Shared between the run slot and the caller, so the handle returned from
/// [`ProcessRunner::start`] is the one [`ProcessRunner::stop`] acts on.
#[derive(Debug)]
pub struct RunHandle {
    id: RunId,
    pid: Option<u32>,
    command: String,
    log_path: PathBuf,
    started_at: Instant,
    inner: Mutex<HandleInner>,
}

#[derive(Debug)]
struct HandleInner {
    child: Child,
    /// Set once the exit has been observed; never cleared
    exit_code: Option<i32>,
}

impl RunHandle {
    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Command line the run was started with
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    fn lock(&self) -> MutexGuard<'_, HandleInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check the process without blocking
    pub fn poll(&self) -> Result<RunState> {
        let mut inner = self.lock();
        self.poll_locked(&mut inner)
    }

    /// Last observed state, without asking the OS
    pub fn observed(&self) -> RunState {
        match self.lock().exit_code {
            Some(exit_code) => RunState::Exited { exit_code },
            None => RunState::Running,
        }
    }

    fn poll_locked(&self, inner: &mut HandleInner) -> Result<RunState> {
        if let Some(exit_code) = inner.exit_code {
            return Ok(RunState::Exited { exit_code });
        }
        match inner.child.try_wait()? {
            Some(status) => {
                let exit_code = exit_code(status);
                inner.exit_code = Some(exit_code);
                info!(
                    run_id = self.id,
                    exit_code,
                    elapsed_ms = self.elapsed().as_millis() as u64,
                    "run exited"
                );
                Ok(RunState::Exited { exit_code })
            }
            None => Ok(RunState::Running),
        }
    }

    /// Request termination; the exit is observed by a later poll
    fn terminate(&self) -> Result<()> {
        let mut inner = self.lock();
        if !self.poll_locked(&mut inner)?.is_running() {
            return Err(DashError::NotRunning);
        }
        send_terminate(&mut inner.child)
    }
}

#[cfg(unix)]
fn send_terminate(child: &mut Child) -> Result<()> {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    // Not yet reaped (we hold the lock and try_wait saw it running), so the pid is still ours
    let Some(pid) = child.id() else {
        return Err(DashError::NotRunning);
    };
    kill(Pid::from_raw(pid as i32), Signal::SIGTERM).map_err(|errno| DashError::Io(errno.into()))
}

#[cfg(not(unix))]
fn send_terminate(child: &mut Child) -> Result<()> {
    child.start_kill().map_err(DashError::from)
}

/// Exit code, or `128 + signal` for a signalled child on unix
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

/// Launches external commands into a single run slot
#[derive(Debug, Default)]
pub struct ProcessRunner {
    slot: Mutex<Option<Arc<RunHandle>>>,
    next_id: AtomicU64,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide runner shared by every page of the dashboard
    pub fn global() -> Arc<ProcessRunner> {
        static GLOBAL: OnceLock<Arc<ProcessRunner>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(ProcessRunner::new())))
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<RunHandle>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn `request` with stdout and stderr redirected into its log file.
    ///
    /// Returns immediately. Fails with [`DashError::AlreadyRunning`] while the
    /// slot holds a run whose exit has not been observed. The slot is checked
    /// and filled under one lock, and left untouched on any failure.
    pub fn start(&self, request: &RunRequest) -> Result<Arc<RunHandle>> {
        let mut slot = self.slot();
        if let Some(current) = slot.as_ref()
            && current.observed().is_running()
        {
            warn!(run_id = current.id, "start rejected, a process is already running");
            return Err(DashError::AlreadyRunning);
        }

        let log_error = |source| DashError::LogFile {
            path: request.log_path().to_path_buf(),
            source,
        };
        let stdout = File::create(request.log_path()).map_err(log_error)?;
        let stderr = stdout.try_clone().map_err(log_error)?;

        let child = Command::new(request.program())
            .args(request.args())
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|source| {
                warn!(program = request.program(), error = %source, "launch failed");
                DashError::LaunchFailed {
                    program: request.program().to_string(),
                    source,
                }
            })?;

        let handle = Arc::new(RunHandle {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            pid: child.id(),
            command: request.display(),
            log_path: request.log_path().to_path_buf(),
            started_at: Instant::now(),
            inner: Mutex::new(HandleInner {
                child,
                exit_code: None,
            }),
        });
        info!(
            run_id = handle.id,
            pid = ?handle.pid,
            command = %handle.command,
            log = %handle.log_path.display(),
            "run started"
        );

        *slot = Some(Arc::clone(&handle));
        Ok(handle)
    }

    /// Non-blocking state check
    pub fn poll(&self, handle: &RunHandle) -> Result<RunState> {
        handle.poll()
    }

    /// Send SIGTERM to a running handle
    pub fn stop(&self, handle: &RunHandle) -> Result<()> {
        handle.terminate()?;
        info!(run_id = handle.id, "termination requested");
        Ok(())
    }

    /// Stop whatever occupies the run slot
    pub fn stop_active(&self) -> Result<()> {
        let active = self.active().ok_or(DashError::NotRunning)?;
        self.stop(&active)
    }

    pub fn active(&self) -> Option<Arc<RunHandle>> {
        self.slot().clone()
    }

    /// Acknowledge an exited handle and free the slot.
    ///
    /// A handle that is not in the slot is ignored; one that is still running
    /// is rejected with [`DashError::AlreadyRunning`].
    pub fn release(&self, handle: &RunHandle) -> Result<()> {
        let mut slot = self.slot();
        let Some(current) = slot.as_ref() else {
            return Ok(());
        };
        if current.id != handle.id {
            return Ok(());
        }
        if current.poll()?.is_running() {
            return Err(DashError::AlreadyRunning);
        }
        *slot = None;
        info!(run_id = handle.id, "run released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn request(dir: &TempDir, command: &[&str]) -> RunRequest {
        RunRequest::new(
            command.iter().map(|s| s.to_string()).collect(),
            dir.path().join("run.log"),
        )
        .unwrap()
    }

    async fn wait_exit(handle: &RunHandle) -> i32 {
        for _ in 0..500 {
            if let RunState::Exited { exit_code } = handle.poll().unwrap() {
                return exit_code;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("process did not exit in time");
    }

    #[tokio::test]
    async fn start_twice_only_first_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new();

        let handle = runner.start(&request(&dir, &["sleep", "30"])).unwrap();
        let second = runner.start(&request(&dir, &["sleep", "30"]));
        assert!(matches!(second, Err(DashError::AlreadyRunning)));

        runner.stop(&handle).unwrap();
        wait_exit(&handle).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_starts_admit_exactly_one() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ProcessRunner::new());

        let tasks: Vec<_> = (0..4)
            .map(|i| {
                let runner = Arc::clone(&runner);
                let request = RunRequest::new(
                    vec!["sleep".into(), "30".into()],
                    dir.path().join(format!("run{i}.log")),
                )
                .unwrap();
                tokio::spawn(async move { runner.start(&request) })
            })
            .collect();

        let mut started = Vec::new();
        let mut rejected = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(handle) => started.push(handle),
                Err(DashError::AlreadyRunning) => rejected += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(started.len(), 1);
        assert_eq!(rejected, 3);

        runner.stop(&started[0]).unwrap();
        wait_exit(&started[0]).await;
    }

    #[tokio::test]
    async fn poll_reports_running_then_exit_code_forever() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new();

        let handle = runner
            .start(&request(&dir, &["sh", "-c", "sleep 0.3; exit 3"]))
            .unwrap();
        assert_eq!(runner.poll(&handle).unwrap(), RunState::Running);

        assert_eq!(wait_exit(&handle).await, 3);
        for _ in 0..3 {
            assert_eq!(
                runner.poll(&handle).unwrap(),
                RunState::Exited { exit_code: 3 }
            );
        }
    }

    #[tokio::test]
    async fn stop_terminates_running_process() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new();

        let handle = runner.start(&request(&dir, &["sleep", "30"])).unwrap();
        runner.stop(&handle).unwrap();

        // SIGTERM = 15
        assert_eq!(wait_exit(&handle).await, 143);
    }

    #[tokio::test]
    async fn stop_active_reaches_the_started_handle() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new();

        let handle = runner.start(&request(&dir, &["sleep", "30"])).unwrap();
        assert_eq!(runner.active().unwrap().id(), handle.id());

        runner.stop_active().unwrap();
        assert_eq!(wait_exit(&handle).await, 143);
    }

    #[tokio::test]
    async fn stop_after_exit_is_not_running() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new();

        let handle = runner.start(&request(&dir, &["true"])).unwrap();
        wait_exit(&handle).await;

        assert!(matches!(runner.stop(&handle), Err(DashError::NotRunning)));
        assert_eq!(handle.observed(), RunState::Exited { exit_code: 0 });
    }

    #[tokio::test]
    async fn stop_active_with_empty_slot_is_not_running() {
        let runner = ProcessRunner::new();
        assert!(matches!(runner.stop_active(), Err(DashError::NotRunning)));
    }

    #[tokio::test]
    async fn launch_failure_leaves_slot_free() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new();

        let err = runner
            .start(&request(&dir, &["nonexistent-binary"]))
            .unwrap_err();
        assert!(matches!(err, DashError::LaunchFailed { .. }));
        assert!(runner.active().is_none());

        let handle = runner.start(&request(&dir, &["true"])).unwrap();
        assert_eq!(wait_exit(&handle).await, 0);
    }

    #[tokio::test]
    async fn unwritable_log_path_leaves_slot_free() {
        let runner = ProcessRunner::new();
        let request = RunRequest::new(
            vec!["true".into()],
            "/nonexistent/benchdash/run.log",
        )
        .unwrap();

        assert!(matches!(
            runner.start(&request),
            Err(DashError::LogFile { .. })
        ));
        assert!(runner.active().is_none());
    }

    #[tokio::test]
    async fn combined_output_lands_in_truncated_log() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("run.log");
        std::fs::write(&log_path, "stale content\n").unwrap();
        let runner = ProcessRunner::new();

        let handle = runner
            .start(&request(&dir, &["sh", "-c", "echo to-stdout; echo to-stderr >&2"]))
            .unwrap();
        wait_exit(&handle).await;

        let log = std::fs::read_to_string(&log_path).unwrap();
        assert!(log.contains("to-stdout"));
        assert!(log.contains("to-stderr"));
        assert!(!log.contains("stale content"));
    }

    #[tokio::test]
    async fn start_after_observed_exit_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new();

        let first = runner.start(&request(&dir, &["true"])).unwrap();
        wait_exit(&first).await;

        let second = runner.start(&request(&dir, &["true"])).unwrap();
        assert_ne!(first.id(), second.id());
        wait_exit(&second).await;
    }

    #[tokio::test]
    async fn release_frees_slot_only_after_exit() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new();

        let handle = runner
            .start(&request(&dir, &["sh", "-c", "sleep 0.3"]))
            .unwrap();
        assert!(matches!(
            runner.release(&handle),
            Err(DashError::AlreadyRunning)
        ));

        wait_exit(&handle).await;
        runner.release(&handle).unwrap();
        assert!(runner.active().is_none());

        // releasing again is a no-op
        runner.release(&handle).unwrap();
    }

    #[test]
    fn global_runner_is_shared() {
        assert!(Arc::ptr_eq(&ProcessRunner::global(), &ProcessRunner::global()));
    }
}
