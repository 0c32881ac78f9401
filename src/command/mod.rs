mod request;
mod runner;
mod shell;

pub use request::{BenchInvocation, RunRequest};
pub use runner::{ProcessRunner, RunHandle, RunId, RunState};
pub use shell::{ShellCommand, ShellEvent, ShellHandle};
