//! Error types shared across Storyreel crates.

use std::path::PathBuf;

/// Top-level error type for Storyreel operations.
#[derive(Debug, thiserror::Error)]
pub enum StoryreelError {
    #[error("Invalid event kind: {kind} (only word boundaries produce cues)")]
    InvalidEventKind { kind: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Missing asset for scene {scene}: {message}")]
    MissingAsset { scene: String, message: String },

    #[error("No usable scenes found in {dir}")]
    NoUsableScenes { dir: PathBuf },

    #[error("Probe failed for {path}: {message}")]
    ProbeFailure { path: PathBuf, message: String },

    #[error("Draft template not found: {path}")]
    TemplateMissing { path: PathBuf },

    #[error("Image selection cancelled")]
    SelectionCancelled,

    #[error("Failed to write {path}: {source}")]
    WriteFailure {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Subtitle parse error at line {line}: {message}")]
    SubtitleParse { line: usize, message: String },

    #[error("Timeline error: {message}")]
    Timeline { message: String },

    #[error("Generation error: {message}")]
    Generation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using StoryreelError.
pub type StoryreelResult<T> = Result<T, StoryreelError>;

impl StoryreelError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: msg.into(),
        }
    }

    pub fn missing_asset(scene: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::MissingAsset {
            scene: scene.into(),
            message: msg.into(),
        }
    }

    pub fn probe(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::ProbeFailure {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn timeline(msg: impl Into<String>) -> Self {
        Self::Timeline {
            message: msg.into(),
        }
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation {
            message: msg.into(),
        }
    }

    pub fn subtitle_parse(line: usize, msg: impl Into<String>) -> Self {
        Self::SubtitleParse {
            line,
            message: msg.into(),
        }
    }

    /// Wrap an I/O error raised while producing bundle output.
    pub fn write_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFailure {
            path: path.into(),
            source,
        }
    }

    /// Whether the error ends a whole run rather than a single scene.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::MissingAsset { .. } | Self::ProbeFailure { .. } | Self::TemplateMissing { .. }
        )
    }
}
