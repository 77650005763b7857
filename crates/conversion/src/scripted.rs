//! Engine that replays a fixed script.
//!
//! Test support: stands in for ffmpeg in orchestrator and session tests.
//! Compiled for this crate's tests and, for dependents, behind the
//! `testing` feature.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use trimcrop_common::error::{TrimcropError, TrimcropResult};
use trimcrop_session_model::request::ConversionRequest;

use crate::engine::{ConversionEngine, ConversionReply, ProgressSink};

/// How a scripted conversion ends.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedOutcome {
    /// Reply with this output reference.
    Output(String),
    /// Reply with an empty result.
    Empty(String),
    /// Fail at the transport level.
    Fault(String),
}

/// Replays `steps` as progress reports, then `outcome`.
#[derive(Debug)]
pub struct ScriptedEngine {
    steps: Vec<f64>,
    outcome: ScriptedOutcome,
    calls: AtomicUsize,
    requests: Mutex<Vec<ConversionRequest>>,
}

impl ScriptedEngine {
    pub fn new(steps: Vec<f64>, outcome: ScriptedOutcome) -> Self {
        Self {
            steps,
            outcome,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of `convert` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received, oldest first.
    pub fn requests(&self) -> Vec<ConversionRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ConversionEngine for ScriptedEngine {
    async fn convert(
        &self,
        request: ConversionRequest,
        progress: ProgressSink,
    ) -> TrimcropResult<ConversionReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        for step in &self.steps {
            progress.report(*step);
            tokio::task::yield_now().await;
        }

        match &self.outcome {
            ScriptedOutcome::Output(output) => Ok(ConversionReply::Completed {
                output: output.clone(),
            }),
            ScriptedOutcome::Empty(reason) => Ok(ConversionReply::empty(reason.clone())),
            ScriptedOutcome::Fault(message) => Err(TrimcropError::transport(message.clone())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
