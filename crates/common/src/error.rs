//! Error types shared across Trimcrop crates.

use std::path::PathBuf;

/// Top-level error type for Trimcrop operations.
#[derive(Debug, thiserror::Error)]
pub enum TrimcropError {
    #[error("A drag interaction is already live on {target}")]
    AlreadyDragging { target: String },

    #[error("No drag interaction is live for this handle")]
    NoActiveDrag,

    #[error("A conversion job is already running")]
    AlreadyRunning,

    #[error("Invalid time range {start}..{end} (minimum span {min_span}s)")]
    InvalidRange { start: f64, end: f64, min_span: f64 },

    #[error("Media could not be loaded: {message}")]
    LoadFailure { message: String },

    #[error("Conversion failed: {reason}")]
    ConversionFailure { reason: String },

    #[error("Conversion engine unreachable: {message}")]
    Transport { message: String },

    #[error("Crop mode is disabled")]
    CropModeDisabled,

    #[error("Target size must be a positive number of megabytes, got {value}")]
    InvalidTargetSize { value: u32 },

    #[error("Media duration is not known yet")]
    DurationUnknown,

    #[error("Editing session is closed")]
    SessionClosed,

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

/// Result type alias using TrimcropError.
pub type TrimcropResult<T> = Result<T, TrimcropError>;

impl TrimcropError {
    pub fn load_failure(msg: impl Into<String>) -> Self {
        Self::LoadFailure {
            message: msg.into(),
        }
    }

    pub fn conversion(reason: impl Into<String>) -> Self {
        Self::ConversionFailure {
            reason: reason.into(),
        }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn already_dragging(target: impl Into<String>) -> Self {
        Self::AlreadyDragging {
            target: target.into(),
        }
    }

    /// Whether this error should be shown to the user as session state.
    ///
    /// Drag and range errors are corrected locally and never surface.
    pub fn is_user_visible(&self) -> bool {
        !matches!(
            self,
            Self::AlreadyDragging { .. }
                | Self::NoActiveDrag
                | Self::InvalidRange { .. }
                | Self::CropModeDisabled
        )
    }
}
