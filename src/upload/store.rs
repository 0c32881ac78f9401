use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::UploadSettings;
use crate::error::{DashError, Result};

/// Models a tokenizer or model config can be uploaded for
pub const MODELS: [&str; 3] = ["LLaMA 3", "Claude", "Other"];

/// Auxiliary files the benchmarking tool reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    HfToken,
    Tokenizer,
    ModelConfig,
}

impl ArtifactKind {
    pub fn label(self) -> &'static str {
        match self {
            ArtifactKind::HfToken => "Hugging Face Token",
            ArtifactKind::Tokenizer => "Tokenizer",
            ArtifactKind::ModelConfig => "Model Config",
        }
    }

    /// Accepted file extension, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::HfToken => "txt",
            ArtifactKind::Tokenizer | ArtifactKind::ModelConfig => "json",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ArtifactKind::HfToken => "text/plain",
            ArtifactKind::Tokenizer | ArtifactKind::ModelConfig => "application/json",
        }
    }

    /// Tokens are not tied to a model
    pub fn is_model_specific(self) -> bool {
        !matches!(self, ArtifactKind::HfToken)
    }
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub file_name: String,
    pub kind: ArtifactKind,
    pub model: Option<String>,
    pub content_type: &'static str,
    pub size: u64,
    pub saved_to: PathBuf,
}

impl UploadReceipt {
    /// Success line shown after the upload
    pub fn summary(&self) -> String {
        match &self.model {
            Some(model) => format!(
                "File '{}' uploaded successfully for model '{}'!",
                self.file_name, model
            ),
            None => format!("File '{}' uploaded successfully!", self.file_name),
        }
    }
}

/// Copies uploaded artifacts into the directories the tool reads from
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    settings: UploadSettings,
}

impl ArtifactStore {
    pub fn new(settings: UploadSettings) -> Self {
        Self { settings }
    }

    pub fn destination_dir(&self, kind: ArtifactKind) -> &Path {
        match kind {
            ArtifactKind::HfToken => &self.settings.token_dir,
            ArtifactKind::Tokenizer => &self.settings.tokenizer_dir,
            ArtifactKind::ModelConfig => &self.settings.model_config_dir,
        }
    }

    /// Copy `source` into the destination for `kind`, keeping its file name
    pub fn upload(&self, kind: ArtifactKind, source: &Path, model: &str) -> Result<UploadReceipt> {
        if !source.is_file() {
            return Err(DashError::NotFound(source.to_path_buf()));
        }
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| DashError::NotFound(source.to_path_buf()))?;

        let extension_ok = source
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(kind.extension()));
        if !extension_ok {
            return Err(DashError::UnsupportedFileType {
                file: file_name,
                expected: kind.extension(),
            });
        }

        let dir = self.destination_dir(kind);
        fs::create_dir_all(dir)?;
        let saved_to = dir.join(&file_name);
        // copying a file onto itself truncates it
        let size = if saved_to.exists()
            && fs::canonicalize(source)? == fs::canonicalize(&saved_to)?
        {
            fs::metadata(source)?.len()
        } else {
            fs::copy(source, &saved_to)?
        };

        info!(
            kind = kind.label(),
            file = %file_name,
            size,
            dest = %saved_to.display(),
            "artifact uploaded"
        );

        Ok(UploadReceipt {
            file_name,
            kind,
            model: kind.is_model_specific().then(|| model.to_string()),
            content_type: kind.content_type(),
            size,
            saved_to,
        })
    }
}
