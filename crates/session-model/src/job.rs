//! Conversion job status.

use serde::{Deserialize, Serialize};

use crate::request::ConversionRequest;

/// Why a job ended without output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobFailure {
    /// The engine answered with an empty result.
    #[error("conversion failed: {reason}")]
    ConversionFailure { reason: String },

    /// The engine could not be reached or its reply was malformed.
    #[error("conversion engine unreachable: {message}")]
    TransportError { message: String },
}

/// Lifecycle of the session's single conversion job.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Idle,
    /// Request dispatched, no progress reported yet.
    Submitted,
    /// Percent complete in `[0, 100]`.
    InProgress(f64),
    /// Output reference returned by the engine.
    Succeeded(String),
    Failed(JobFailure),
}

impl JobStatus {
    /// Submitted or in progress.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Submitted | Self::InProgress(_))
    }

    /// Succeeded or failed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }

    /// Progress percentage for display.
    pub fn percent(&self) -> f64 {
        match self {
            Self::Idle | Self::Submitted | Self::Failed(_) => 0.0,
            Self::InProgress(p) => *p,
            Self::Succeeded(_) => 100.0,
        }
    }

    /// Human-readable stage for progress displays.
    pub fn stage_message(&self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Submitted => "Starting process...",
            Self::InProgress(p) if *p <= 25.0 => "Analyzing video...",
            Self::InProgress(p) if *p <= 50.0 => "Trimming content...",
            Self::InProgress(p) if *p <= 75.0 => "Applying effects...",
            Self::InProgress(_) => "Optimizing output...",
            Self::Succeeded(_) => "Successfully converted",
            Self::Failed(JobFailure::ConversionFailure { .. }) => {
                "Failed to convert. Video can not be compressed to the target size"
            }
            Self::Failed(JobFailure::TransportError { .. }) => {
                "An unexpected error has occurred. Check the logs for details."
            }
        }
    }
}

/// The session's conversion job: the frozen request and its status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionJob {
    /// Request frozen at submission; `None` while idle.
    pub request: Option<ConversionRequest>,

    pub status: JobStatus,

    /// Submission timestamp (RFC 3339).
    pub submitted_at: Option<String>,
}

impl ConversionJob {
    /// A freshly submitted job.
    pub fn submitted(request: ConversionRequest) -> Self {
        Self {
            request: Some(request),
            status: JobStatus::Submitted,
            submitted_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}
