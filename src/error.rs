use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the dashboard core
#[derive(Debug, Error)]
pub enum DashError {
    /// Root directory, folder or source file does not exist
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The external command could not be spawned
    #[error("failed to launch `{program}`: {source}")]
    LaunchFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The run slot is occupied by a running process
    #[error("a process is already running")]
    AlreadyRunning,

    /// Stop requested for a handle that is not running
    #[error("no process is running")]
    NotRunning,

    /// The log file could not be created
    #[error("cannot create log file {}: {source}", .path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Uploaded file has the wrong extension
    #[error("unsupported file type for {file}: expected .{expected}")]
    UnsupportedFileType { file: String, expected: &'static str },

    /// Malformed run request
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Settings failed to load or validate
    #[error("settings error: {0}")]
    Settings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, DashError>;
