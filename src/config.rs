//! Dashboard settings.
//!
//! Layered with figment, lowest to highest precedence:
//! 1. Programmatic defaults
//! 2. `benchdash.yaml` in the working directory, or an explicit settings file
//! 3. `BENCHDASH_*` environment variables (`__` separates nested keys)
//!
//! Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

use crate::error::{DashError, Result};

/// Default settings file looked up in the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "benchdash.yaml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "BENCHDASH_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root directory holding benchmark config folders
    pub config_root: PathBuf,
    pub bench: BenchSettings,
    pub uploads: UploadSettings,
    pub setup: SetupSettings,
    pub ui: UiSettings,
    pub logging: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_root: PathBuf::from("../src/fmbench/configs"),
            bench: BenchSettings::default(),
            uploads: UploadSettings::default(),
            setup: SetupSettings::default(),
            ui: UiSettings::default(),
            logging: LogSettings::default(),
        }
    }
}

/// How the benchmarking tool is invoked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchSettings {
    pub program: String,
    pub local_mode: String,
    pub write_bucket: String,
    pub tmp_dir: PathBuf,
    /// Combined stdout/stderr of the tool lands here
    pub log_file: PathBuf,
    pub poll_interval_ms: u64,
}

impl Default for BenchSettings {
    fn default() -> Self {
        Self {
            program: "fmbench".into(),
            local_mode: "yes".into(),
            write_bucket: "placeholder".into(),
            tmp_dir: PathBuf::from("/tmp"),
            log_file: PathBuf::from("fmbench.log"),
            poll_interval_ms: 1000,
        }
    }
}

impl BenchSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Destination directories for uploaded artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    pub token_dir: PathBuf,
    pub tokenizer_dir: PathBuf,
    pub model_config_dir: PathBuf,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            token_dir: PathBuf::from("/tmp"),
            tokenizer_dir: PathBuf::from("/tmp"),
            model_config_dir: PathBuf::from("/tmp/fmbench-read"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupSettings {
    /// Shell line executed by the first-time setup action
    pub command: String,
}

impl Default for SetupSettings {
    fn default() -> Self {
        Self {
            command: "curl -s https://raw.githubusercontent.com/aws-samples/foundation-model-benchmarking-tool/main/copy_s3_content.sh | sh -s -- /tmp".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Lines of log and setup output kept for display (0 for unlimited)
    pub max_buffer_lines: usize,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            max_buffer_lines: 10000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Directory for `benchdash.log`; the platform temp dir when unset
    pub directory: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
            directory: None,
        }
    }
}

impl Settings {
    /// Load from defaults, `benchdash.yaml` and the environment
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment(Path::new(DEFAULT_SETTINGS_FILE)))
    }

    /// Load using an explicit settings file instead of `benchdash.yaml`
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DashError::NotFound(path.to_path_buf()));
        }
        Self::from_figment(Self::figment(path))
    }

    fn figment(file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Yaml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let settings: Settings = figment
            .extract()
            .map_err(|e| DashError::Settings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bench.program.trim().is_empty() {
            return Err(DashError::Settings("bench.program cannot be empty".into()));
        }
        if self.bench.poll_interval_ms == 0 {
            return Err(DashError::Settings(
                "bench.poll_interval_ms must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
