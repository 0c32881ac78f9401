use std::path::{Path, PathBuf};

use crate::config::BenchSettings;
use crate::error::{DashError, Result};

/// An external command and the file its combined output goes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    command: Vec<String>,
    log_path: PathBuf,
}

impl RunRequest {
    /// `command` is the program followed by its arguments and must not be empty
    pub fn new(command: Vec<String>, log_path: impl Into<PathBuf>) -> Result<Self> {
        match command.first() {
            Some(program) if !program.is_empty() => Ok(Self {
                command,
                log_path: log_path.into(),
            }),
            _ => Err(DashError::InvalidRequest("command is empty".into())),
        }
    }

    pub fn program(&self) -> &str {
        &self.command[0]
    }

    pub fn args(&self) -> &[String] {
        &self.command[1..]
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Space-joined command line for display
    pub fn display(&self) -> String {
        self.command.join(" ")
    }
}

/// Command line of one benchmarking run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchInvocation {
    pub program: String,
    pub config_file: PathBuf,
    pub local_mode: String,
    pub write_bucket: String,
    pub tmp_dir: PathBuf,
}

impl BenchInvocation {
    pub fn new(settings: &BenchSettings, config_file: impl Into<PathBuf>) -> Self {
        Self {
            program: settings.program.clone(),
            config_file: config_file.into(),
            local_mode: settings.local_mode.clone(),
            write_bucket: settings.write_bucket.clone(),
            tmp_dir: settings.tmp_dir.clone(),
        }
    }

    /// Program followed by its flags, passed to the tool verbatim
    pub fn args(&self) -> Vec<String> {
        vec![
            self.program.clone(),
            "--config-file".into(),
            self.config_file.display().to_string(),
            "--local-mode".into(),
            self.local_mode.clone(),
            "--write-bucket".into(),
            self.write_bucket.clone(),
            "--tmp-dir".into(),
            self.tmp_dir.display().to_string(),
        ]
    }

    pub fn into_request(self, log_path: impl Into<PathBuf>) -> Result<RunRequest> {
        RunRequest::new(self.args(), log_path)
    }
}
