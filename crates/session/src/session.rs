//! Editing session management.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use trimcrop_common::config::EditorDefaults;
use trimcrop_common::error::{TrimcropError, TrimcropResult};
use trimcrop_common::logging::{log_event, LogLevel};
use trimcrop_conversion::{DebouncedTrigger, JobOrchestrator};
use trimcrop_editor_core::{
    CropSelector, DragEngine, DragHandle, DragTarget, PlaybackController, PlaybackState, Point,
    ReferenceFrame, ToggleOutcome,
};
use trimcrop_session_model::crop::CropRect;
use trimcrop_session_model::job::{JobFailure, JobStatus};
use trimcrop_session_model::range::{RangeBound, TimeRange};
use trimcrop_session_model::request::{ConversionRequest, SessionSnapshot, SourceRef};

use crate::resolver::{normalize_media_path, MediaResolver};

const LOG_CATEGORY: &str = "VideoEditor";

/// Lifecycle of an editing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum SessionPhase {
    /// Waiting for the preview surface to report the duration.
    Loading,
    /// Media loaded; editing enabled.
    Ready,
    /// The media could not be loaded.
    LoadFailed(String),
    /// Torn down; events are ignored.
    Closed,
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub phase: SessionPhase,
    pub source: SourceRef,
    pub duration: Option<f64>,
    pub current_time: f64,
    pub playing: bool,
    pub range: Option<TimeRange>,
    pub crop: CropRect,
    pub crop_preview: Option<CropRect>,
    pub crop_mode: bool,
    pub dragging: Option<DragTarget>,
    pub target_size_mb: u32,
    pub job: JobStatus,
    pub progress: f64,
    pub stage: String,
    /// Message for a surfaced failure.
    pub error: Option<String>,
    /// Whether the user should be offered a way back after a failure.
    pub can_return: bool,
}

/// One loaded clip being trimmed, cropped and exported.
pub struct EditingSession {
    source: SourceRef,
    phase: SessionPhase,
    playback: PlaybackController,
    crop: CropSelector,
    drag: DragEngine,
    live_drag: Option<DragHandle>,
    resume_after_crop: bool,
    target_size_mb: u32,
    orchestrator: JobOrchestrator,
    auto_export: DebouncedTrigger<u32>,
}

impl EditingSession {
    /// Open a session on `path`.
    ///
    /// Load problems never fail the call; they leave the session in
    /// [`SessionPhase::LoadFailed`].
    pub fn open(
        path: &str,
        resolver: &dyn MediaResolver,
        orchestrator: JobOrchestrator,
        defaults: &EditorDefaults,
    ) -> Self {
        let normalized = normalize_media_path(path);
        let mut source = SourceRef::from_path(normalized.clone());
        source.mime_type = resolver.mime_type(&normalized).to_string();

        let phase = if !resolver.file_exists(path) {
            SessionPhase::LoadFailed(TrimcropError::FileNotFound {
                path: normalized.clone().into(),
            }
            .to_string())
        } else {
            match resolver.resolve_playable_url(path) {
                Ok(url) => {
                    source.playable_url = url;
                    SessionPhase::Loading
                }
                Err(err) => SessionPhase::LoadFailed(err.to_string()),
            }
        };

        if let SessionPhase::LoadFailed(message) = &phase {
            log_event(message, LogLevel::Error, Some(LOG_CATEGORY));
        }
        tracing::info!(
            source = %source.path,
            mime = %source.mime_type,
            engine = orchestrator.engine_name(),
            phase = ?phase,
            "Editing session opened"
        );

        Self {
            source,
            phase,
            playback: PlaybackController::new(defaults.min_span_secs),
            crop: CropSelector::new(defaults.min_crop_percent),
            drag: DragEngine::new(),
            live_drag: None,
            resume_after_crop: false,
            target_size_mb: defaults.default_target_size_mb.max(1),
            orchestrator,
            auto_export: DebouncedTrigger::new(defaults.auto_export_debounce()),
        }
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    pub fn job_status(&self) -> &JobStatus {
        self.orchestrator.status()
    }

    /// The preview surface reported the clip duration.
    pub fn on_media_loaded(&mut self, duration: f64) {
        if self.phase == SessionPhase::Closed {
            return;
        }
        match self.playback.set_duration(duration) {
            Ok(range) => {
                if self.phase == SessionPhase::Loading {
                    self.phase = SessionPhase::Ready;
                    log_event(
                        &format!("Video loaded, duration {duration:.2}s"),
                        LogLevel::Info,
                        Some(LOG_CATEGORY),
                    );
                }
                tracing::debug!(start = range.start, end = range.end, "trim range initialized");
            }
            Err(err) => self.fail_load(err.to_string()),
        }
    }

    /// The preview surface could not load the media.
    pub fn on_media_error(&mut self, message: &str) {
        if self.phase == SessionPhase::Closed {
            return;
        }
        self.fail_load(TrimcropError::load_failure(message).to_string());
    }

    /// Seek the playhead; returns the applied time.
    pub fn seek(&mut self, time: f64) -> TrimcropResult<f64> {
        self.ensure_open()?;
        Ok(self.playback.seek(time))
    }

    /// Seek to the time under a click on the timeline strip.
    pub fn click_timeline(&mut self, frame: &ReferenceFrame, point: Point) -> TrimcropResult<f64> {
        self.ensure_open()?;
        self.playback.seek_fraction(frame, point)
    }

    pub fn toggle_play(&mut self) -> TrimcropResult<ToggleOutcome> {
        self.ensure_open()?;
        self.resume_after_crop = false;
        Ok(self.playback.toggle_play())
    }

    /// Position report from the preview surface; returns a corrective seek.
    pub fn on_tick(&mut self, reported: f64) -> Option<f64> {
        if self.phase == SessionPhase::Closed {
            return None;
        }
        self.playback.on_tick(reported)
    }

    /// Start dragging a range handle.
    pub fn begin_range_drag(
        &mut self,
        which: RangeBound,
        frame: ReferenceFrame,
        point: Point,
    ) -> TrimcropResult<()> {
        self.ensure_open()?;
        let handle = self
            .playback
            .begin_handle_drag(&mut self.drag, which, frame, point)?;
        self.live_drag = Some(handle);
        Ok(())
    }

    /// Start a crop selection. Playback pauses until the selection commits.
    ///
    /// Returns the new playback state when the surface has to pause.
    pub fn begin_crop(
        &mut self,
        frame: ReferenceFrame,
        point: Point,
    ) -> TrimcropResult<Option<PlaybackState>> {
        self.ensure_open()?;
        let handle = self.crop.start_selection(&mut self.drag, frame, point)?;
        self.live_drag = Some(handle);
        self.resume_after_crop = self.playback.is_playing();
        if !self.resume_after_crop {
            return Ok(None);
        }
        self.playback.set_state(PlaybackState::Stopped);
        Ok(Some(PlaybackState::Stopped))
    }

    /// Follow the pointer of the live drag; returns a seek for the surface.
    pub fn update_drag(&mut self, point: Point) -> TrimcropResult<Option<f64>> {
        self.ensure_open()?;
        let handle = self.live_drag.as_ref().ok_or(TrimcropError::NoActiveDrag)?;
        match handle.target() {
            DragTarget::Crop => {
                self.crop
                    .update_selection(&mut self.drag, handle, point)?;
                Ok(None)
            }
            DragTarget::StartHandle | DragTarget::EndHandle => {
                self.playback
                    .drag_handle(&mut self.drag, handle, point)
            }
        }
    }

    /// Release the live drag and commit its result.
    ///
    /// Returns the new playback state when a crop commit resumes playback.
    pub fn end_drag(&mut self) -> TrimcropResult<Option<PlaybackState>> {
        self.ensure_open()?;
        let handle = self.live_drag.take().ok_or(TrimcropError::NoActiveDrag)?;
        let mut resumed = None;
        match handle.target() {
            DragTarget::Crop => {
                let crop = self.crop.commit_selection(&mut self.drag, handle)?;
                if std::mem::take(&mut self.resume_after_crop) {
                    self.playback.set_state(PlaybackState::Playing);
                    resumed = Some(PlaybackState::Playing);
                }
                log_event(
                    &format!(
                        "Crop set to x={:.1} y={:.1} w={:.1} h={:.1}",
                        crop.x, crop.y, crop.width, crop.height
                    ),
                    LogLevel::Debug,
                    Some(LOG_CATEGORY),
                );
            }
            DragTarget::StartHandle | DragTarget::EndHandle => {
                self.playback.end_handle_drag(&mut self.drag, handle)?;
            }
        }
        Ok(resumed)
    }

    /// Move a range bound to `seconds` without a drag (numeric entry).
    pub fn set_range_bound(&mut self, which: RangeBound, seconds: f64) -> TrimcropResult<Option<f64>> {
        self.ensure_open()?;
        self.playback.set_range_handle(which, seconds)
    }

    /// Set the crop rectangle without a drag (numeric entry).
    pub fn set_crop(&mut self, rect: CropRect) -> TrimcropResult<CropRect> {
        self.ensure_open()?;
        if !self.crop.is_enabled() {
            return Err(TrimcropError::CropModeDisabled);
        }
        Ok(self.crop.set_crop(rect))
    }

    pub fn set_crop_mode(&mut self, enabled: bool) {
        self.crop.toggle_mode(enabled);
    }

    pub fn reset_crop(&mut self) {
        self.crop.reset();
    }

    /// Set the export target size in megabytes.
    pub fn set_target_size(&mut self, megabytes: u32) -> TrimcropResult<()> {
        if megabytes == 0 {
            return Err(TrimcropError::InvalidTargetSize { value: megabytes });
        }
        self.target_size_mb = megabytes;
        Ok(())
    }

    /// Capture the state an export is built from.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            source: self.source.clone(),
            duration: self.playback.duration(),
            range: self.playback.range(),
            crop: self.crop.effective_crop(),
            target_size_mb: self.target_size_mb,
        }
    }

    /// Submit an export of the current selection.
    pub fn export(&mut self) -> TrimcropResult<ConversionRequest> {
        self.ensure_open()?;
        if let SessionPhase::LoadFailed(message) = &self.phase {
            return Err(TrimcropError::load_failure(message.clone()));
        }
        let request = self.orchestrator.submit(&self.snapshot())?;
        log_event("Export started", LogLevel::Info, Some("VideoExport"));
        Ok(request)
    }

    /// Ask for an export once calls stop arriving for the debounce window.
    pub fn request_auto_export(&mut self, now: Instant) {
        if self.phase == SessionPhase::Closed {
            return;
        }
        self.auto_export.call(self.target_size_mb, now);
    }

    /// Fire a due automatic export.
    pub fn tick(&mut self, now: Instant) -> TrimcropResult<Option<ConversionRequest>> {
        match self.auto_export.fire_if_due(now, |size| size) {
            Some(size) => {
                self.target_size_mb = size;
                self.export().map(Some)
            }
            None => Ok(None),
        }
    }

    /// When a pending automatic export becomes due.
    pub fn auto_export_deadline(&self) -> Option<Instant> {
        self.auto_export.deadline()
    }

    /// Apply conversion events that have arrived; returns whether anything changed.
    pub fn pump(&mut self) -> bool {
        let changed = self.orchestrator.poll();
        if changed {
            self.log_job_outcome();
        }
        changed
    }

    /// Wait for the next conversion event.
    pub async fn next_job_update(&mut self) -> Option<JobStatus> {
        let status = self.orchestrator.next_update().await;
        self.log_job_outcome();
        status
    }

    /// Output of a successful export; yields it exactly once.
    pub fn take_export_success(&mut self) -> Option<String> {
        self.orchestrator.take_success()
    }

    /// Return the job to Idle after a terminal outcome.
    pub fn reset_job(&mut self) {
        self.orchestrator.reset();
    }

    pub fn view(&self) -> SessionView {
        let job = self.orchestrator.status().clone();
        let error = match (&self.phase, &job) {
            (SessionPhase::LoadFailed(message), _) => Some(message.clone()),
            (_, JobStatus::Failed(JobFailure::ConversionFailure { .. })) => Some(format!(
                "Failed to convert. Video can not be compressed to {}mb",
                self.orchestrator
                    .job()
                    .request
                    .as_ref()
                    .map(|request| request.target_size)
                    .unwrap_or(self.target_size_mb)
            )),
            (_, JobStatus::Failed(failure @ JobFailure::TransportError { .. })) => {
                Some(failure.to_string())
            }
            _ => None,
        };

        SessionView {
            phase: self.phase.clone(),
            source: self.source.clone(),
            duration: self.playback.duration(),
            current_time: self.playback.current_time(),
            playing: self.playback.is_playing(),
            range: self.playback.range(),
            crop: self.crop.crop(),
            crop_preview: self.crop.preview(),
            crop_mode: self.crop.is_enabled(),
            dragging: self.drag.live_target(),
            target_size_mb: self.target_size_mb,
            progress: job.percent(),
            stage: job.stage_message().to_string(),
            job,
            can_return: error.is_some(),
            error,
        }
    }

    /// Tear the session down. Later events are ignored.
    pub fn close(&mut self) {
        if self.phase == SessionPhase::Closed {
            return;
        }
        if let Some(target) = self.drag.cancel() {
            tracing::debug!(target = target.as_str(), "live drag dropped on close");
        }
        self.live_drag = None;
        self.auto_export.cancel();
        self.playback.set_state(PlaybackState::Stopped);
        self.orchestrator.close();
        self.phase = SessionPhase::Closed;
        tracing::info!(source = %self.source.path, "Editing session closed");
    }

    fn ensure_open(&self) -> TrimcropResult<()> {
        if self.phase == SessionPhase::Closed {
            return Err(TrimcropError::SessionClosed);
        }
        Ok(())
    }

    fn fail_load(&mut self, message: String) {
        tracing::warn!(error = %message, "media load failed");
        log_event(&message, LogLevel::Error, Some(LOG_CATEGORY));
        self.phase = SessionPhase::LoadFailed(message);
    }

    fn log_job_outcome(&self) {
        match self.orchestrator.status() {
            JobStatus::Succeeded(output) => log_event(
                &format!("Export finished: {output}"),
                LogLevel::Info,
                Some("VideoExport"),
            ),
            JobStatus::Failed(failure) => {
                log_event(&failure.to_string(), LogLevel::Error, Some("VideoExport"))
            }
            _ => {}
        }
    }
}

impl std::fmt::Debug for EditingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditingSession")
            .field("source", &self.source.path)
            .field("phase", &self.phase)
            .field("job", self.orchestrator.status())
            .finish()
    }
}

impl Drop for EditingSession {
    fn drop(&mut self) {
        self.close();
    }
}
