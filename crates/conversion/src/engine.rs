//! Conversion engine contract.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use trimcrop_common::error::TrimcropResult;
use trimcrop_session_model::request::ConversionRequest;

/// Well-formed answer of an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversionReply {
    /// Output reference (a path for the ffmpeg engine).
    Completed { output: String },
    /// The engine produced nothing.
    Empty { reason: String },
}

impl ConversionReply {
    /// Map a raw optional result; `None` and `""` both mean "no output".
    pub fn from_output(output: Option<String>) -> Self {
        match output {
            Some(output) if !output.trim().is_empty() => Self::Completed { output },
            _ => Self::Empty {
                reason: "engine returned no output".to_string(),
            },
        }
    }

    pub fn empty(reason: impl Into<String>) -> Self {
        Self::Empty {
            reason: reason.into(),
        }
    }
}

/// Event delivered from a running conversion to its orchestrator.
#[derive(Debug)]
pub enum EngineEvent {
    /// Percent complete, as reported by the engine (untrusted).
    Progress(f64),
    /// The engine call returned.
    Finished(TrimcropResult<ConversionReply>),
}

/// Progress channel handed to an engine for one job.
///
/// Reports are fire-and-forget: once the receiving side is gone they are
/// silently dropped.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl ProgressSink {
    /// Create a sink and the receiver its events arrive on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Report percent complete.
    pub fn report(&self, percent: f64) {
        let _ = self.tx.send(EngineEvent::Progress(percent));
    }

    pub(crate) fn finish(self, result: TrimcropResult<ConversionReply>) {
        let _ = self.tx.send(EngineEvent::Finished(result));
    }
}

/// An external conversion engine reached asynchronously.
///
/// `Ok` carries a well-formed reply; `Err` is a transport-level fault
/// (engine unreachable, binary missing, malformed reply).
#[async_trait::async_trait]
pub trait ConversionEngine: Send + Sync {
    /// Run one conversion, reporting progress through `progress`.
    async fn convert(
        &self,
        request: ConversionRequest,
        progress: ProgressSink,
    ) -> TrimcropResult<ConversionReply>;

    /// Engine name for logs.
    fn name(&self) -> &str;
}
