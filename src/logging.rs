use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LogSettings;
use crate::error::{DashError, Result};

/// File name of the dashboard's own log
pub const LOG_FILE_NAME: &str = "benchdash.log";

/// Resolve the directory the dashboard log is written to
pub fn log_dir(settings: &LogSettings) -> PathBuf {
    settings
        .directory
        .clone()
        .unwrap_or_else(std::env::temp_dir)
}

/// Install the global tracing subscriber.
///
/// The terminal belongs to the TUI, so everything goes to a file through a
/// non-blocking writer. Keep the returned guard alive until exit or buffered
/// records are lost.
pub fn init(settings: &LogSettings) -> Result<WorkerGuard> {
    let dir = log_dir(settings);
    std::fs::create_dir_all(&dir)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| DashError::Settings(format!("invalid log level: {e}")))?;

    let (writer, guard) = tracing_appender::non_blocking(rolling::never(&dir, LOG_FILE_NAME));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .map_err(|e| DashError::Settings(e.to_string()))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_dir_prefers_configured_directory() {
        let settings = LogSettings {
            level: "debug".into(),
            directory: Some(PathBuf::from("/var/log/benchdash")),
        };
        assert_eq!(log_dir(&settings), PathBuf::from("/var/log/benchdash"));
    }

    #[test]
    fn log_dir_falls_back_to_temp_dir() {
        assert_eq!(log_dir(&LogSettings::default()), std::env::temp_dir());
    }
}
