//! Single-flight conversion job orchestration.
//!
//! One [`JobOrchestrator`] belongs to one editing session. It dispatches at
//! most one request at a time to the engine and folds the engine's events
//! into the session's [`ConversionJob`]. All state changes happen on the
//! caller's thread when it drains events through [`JobOrchestrator::poll`]
//! or [`JobOrchestrator::next_update`].

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use trimcrop_common::error::{TrimcropError, TrimcropResult};
use trimcrop_session_model::job::{ConversionJob, JobFailure, JobStatus};
use trimcrop_session_model::request::{ConversionRequest, SessionSnapshot};

use crate::engine::{ConversionEngine, ConversionReply, EngineEvent, ProgressSink};

/// Drives the session's conversion job.
pub struct JobOrchestrator {
    engine: Arc<dyn ConversionEngine>,
    runtime: Handle,
    job: ConversionJob,
    events: Option<mpsc::UnboundedReceiver<EngineEvent>>,
    task: Option<JoinHandle<()>>,
    pending_success: Option<String>,
    closed: bool,
}

impl std::fmt::Debug for JobOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobOrchestrator")
            .field("engine", &self.engine.name())
            .field("job", &self.job)
            .field("subscribed", &self.events.is_some())
            .field("dispatched", &self.task.is_some())
            .field("closed", &self.closed)
            .finish()
    }
}

impl JobOrchestrator {
    /// Create an orchestrator dispatching to `engine` on `runtime`.
    pub fn new(engine: Arc<dyn ConversionEngine>, runtime: Handle) -> Self {
        Self {
            engine,
            runtime,
            job: ConversionJob::default(),
            events: None,
            task: None,
            pending_success: None,
            closed: false,
        }
    }

    /// Freeze a request from `snapshot` and dispatch it.
    ///
    /// Fails with `AlreadyRunning` while a job is live, leaving the frozen
    /// request untouched. A terminal job is replaced.
    pub fn submit(&mut self, snapshot: &SessionSnapshot) -> TrimcropResult<ConversionRequest> {
        if self.closed {
            return Err(TrimcropError::SessionClosed);
        }
        if self.job.status.is_live() {
            tracing::debug!("submit rejected, job already running");
            return Err(TrimcropError::AlreadyRunning);
        }

        let request = ConversionRequest::from_snapshot(snapshot);
        self.job = ConversionJob::submitted(request.clone());
        self.pending_success = None;

        let (sink, rx) = ProgressSink::channel();
        let engine = Arc::clone(&self.engine);
        let dispatched = request.clone();
        self.events = Some(rx);
        self.task = Some(self.runtime.spawn(async move {
            let result = engine.convert(dispatched, sink.clone()).await;
            sink.finish(result);
        }));

        tracing::info!(
            engine = self.engine.name(),
            input = %request.input,
            target_size_mb = request.target_size,
            start = ?request.start_time,
            end = ?request.end_time,
            cropped = request.crop.is_some(),
            "Conversion submitted"
        );
        Ok(request)
    }

    /// Drain every event that has already arrived, without blocking.
    ///
    /// Returns whether the job status changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        loop {
            let Some(rx) = self.events.as_mut() else {
                break;
            };
            match rx.try_recv() {
                Ok(event) => changed |= self.handle_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    changed |= self.handle_disconnect();
                    break;
                }
            }
        }
        changed
    }

    /// Wait for the next event and apply it.
    ///
    /// Returns the status afterwards, or `None` once nothing is subscribed.
    pub async fn next_update(&mut self) -> Option<JobStatus> {
        let rx = self.events.as_mut()?;
        match rx.recv().await {
            Some(event) => {
                self.handle_event(event);
            }
            None => {
                self.handle_disconnect();
            }
        }
        Some(self.job.status.clone())
    }

    /// Wait until the live job reaches a terminal state.
    pub async fn wait_terminal(&mut self) -> JobStatus {
        while !self.job.status.is_terminal() {
            if self.next_update().await.is_none() {
                break;
            }
        }
        self.job.status.clone()
    }

    /// Record a progress report.
    ///
    /// Values are clamped to `[0, 100]`. Reports lower than the last
    /// recorded one, and reports for a job that is not live, are ignored.
    /// Returns whether the report was applied.
    pub fn apply_progress(&mut self, percent: f64) -> bool {
        if self.closed || !self.job.status.is_live() {
            tracing::trace!(percent, status = ?self.job.status, "progress ignored, job not live");
            return false;
        }
        if !percent.is_finite() {
            tracing::warn!(percent, "non-finite progress ignored");
            return false;
        }

        let percent = percent.clamp(0.0, 100.0);
        if let JobStatus::InProgress(last) = self.job.status {
            if percent < last {
                tracing::debug!(percent, last, "out-of-order progress ignored");
                return false;
            }
        }
        self.job.status = JobStatus::InProgress(percent);
        tracing::debug!(percent, "Conversion progress");
        true
    }

    /// Record the engine's reply. Only the first terminal outcome counts.
    pub fn apply_reply(&mut self, reply: ConversionReply) -> bool {
        if self.closed || !self.job.status.is_live() {
            tracing::debug!(?reply, "reply ignored, job not live");
            return false;
        }
        match reply {
            ConversionReply::Completed { output } => {
                tracing::info!(output = %output, "Conversion succeeded");
                self.pending_success = Some(output.clone());
                self.job.status = JobStatus::Succeeded(output);
            }
            ConversionReply::Empty { reason } => {
                tracing::warn!(reason = %reason, "Conversion produced no output");
                self.job.status = JobStatus::Failed(JobFailure::ConversionFailure { reason });
            }
        }
        true
    }

    /// Record a transport-level fault.
    pub fn apply_transport_error(&mut self, message: impl Into<String>) -> bool {
        if self.closed || !self.job.status.is_live() {
            return false;
        }
        let message = message.into();
        tracing::error!(error = %message, "Conversion engine unreachable");
        self.job.status = JobStatus::Failed(JobFailure::TransportError { message });
        true
    }

    /// Take the output of a successful job; yields it exactly once.
    pub fn take_success(&mut self) -> Option<String> {
        self.pending_success.take()
    }

    /// Return to Idle for a new export.
    ///
    /// A live job is no longer observed; the engine is not told.
    pub fn reset(&mut self) {
        if self.job.status.is_live() {
            tracing::warn!("live conversion abandoned by reset");
        }
        self.unsubscribe();
        self.job = ConversionJob::default();
        self.pending_success = None;
    }

    /// Stop observing for good. Later events are ignored and `submit` fails.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.unsubscribe();
        tracing::debug!(status = ?self.job.status, "orchestrator closed");
    }

    pub fn status(&self) -> &JobStatus {
        &self.job.status
    }

    pub fn job(&self) -> &ConversionJob {
        &self.job
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    fn handle_event(&mut self, event: EngineEvent) -> bool {
        match event {
            EngineEvent::Progress(percent) => self.apply_progress(percent),
            EngineEvent::Finished(Ok(reply)) => self.apply_reply(reply),
            EngineEvent::Finished(Err(err)) => self.apply_transport_error(err.to_string()),
        }
    }

    /// The engine task ended; a job still live never got its reply.
    fn handle_disconnect(&mut self) -> bool {
        self.events = None;
        self.task = None;
        self.apply_transport_error("conversion task ended without a reply")
    }

    fn unsubscribe(&mut self) {
        self.events = None;
        // Dropping the handle detaches the task; it runs to completion unobserved.
        self.task = None;
    }
}
