use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::warn;

use crate::buffer::{OutputKind, OutputLine};

/// Output event from a shell command
#[derive(Debug)]
pub enum ShellEvent {
    /// One line of stdout or stderr
    Output(OutputLine),
}

/// Handle for a running shell command
pub struct ShellHandle {
    child: Child,
    receiver: mpsc::Receiver<ShellEvent>,
}

impl ShellHandle {
    /// Kill the process with SIGKILL
    pub async fn kill(&mut self) -> std::io::Result<()> {
        self.child.kill().await
    }

    /// Wait for the process to exit and return the exit code
    pub async fn wait(&mut self) -> std::io::Result<i32> {
        let status = self.child.wait().await?;
        Ok(status.code().unwrap_or(-1))
    }

    /// Receive the next output line; `None` once both streams are closed
    pub async fn next_event(&mut self) -> Option<ShellEvent> {
        self.receiver.recv().await
    }
}

/// Runs one-off shell lines such as the first-time setup script
pub struct ShellCommand;

impl ShellCommand {
    /// Spawn `sh -c "line"`, capturing stdout/stderr line by line.
    ///
    /// The child is killed if the handle is dropped before it exits.
    pub fn spawn(line: &str) -> std::io::Result<ShellHandle> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let (tx, rx) = mpsc::channel(1000);

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, OutputKind::Stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, OutputKind::Stderr, tx.clone()));
        }

        // Channel closes when both reader tasks finish
        drop(tx);

        Ok(ShellHandle {
            child,
            receiver: rx,
        })
    }
}

async fn forward_lines<R>(stream: R, kind: OutputKind, tx: mpsc::Sender<ShellEvent>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(stream = ?kind, error = %e, "shell output read failed");
                break;
            }
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        // Scripts may print non-UTF-8 bytes; keep the line readable
        let line = String::from_utf8_lossy(&buf).into_owned();
        if tx
            .send(ShellEvent::Output(OutputLine::new(kind, line)))
            .await
            .is_err()
        {
            break;
        }
    }
}
