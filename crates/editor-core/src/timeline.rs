//! Playback control confined to the trim range.
//!
//! The controller owns the playhead, the play/pause state and the trim
//! range. The media surface drives it with [`PlaybackController::on_tick`];
//! whenever the controller corrects the position it returns the time the
//! surface should seek to.

use serde::{Deserialize, Serialize};
use trimcrop_common::error::{TrimcropError, TrimcropResult};
use trimcrop_session_model::range::{RangeBound, TimeRange, DEFAULT_MIN_SPAN_SECS, TIME_EPSILON};

use crate::drag::{DragEngine, DragHandle, DragTarget, Point, ReferenceFrame};

/// Transport state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

/// Result of a play/pause toggle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToggleOutcome {
    pub state: PlaybackState,
    /// Where the media surface must seek before playing, if it moved.
    pub seek_to: Option<f64>,
}

/// Playhead, transport and trim range for one clip.
#[derive(Debug, Clone)]
pub struct PlaybackController {
    duration: Option<f64>,
    range: Option<TimeRange>,
    current_time: f64,
    state: PlaybackState,
    min_span: f64,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SPAN_SECS)
    }
}

impl PlaybackController {
    /// Create a controller for a clip whose duration is not known yet.
    pub fn new(min_span: f64) -> Self {
        Self {
            duration: None,
            range: None,
            current_time: 0.0,
            state: PlaybackState::Stopped,
            min_span,
        }
    }

    /// Fix the clip duration and select the whole clip.
    ///
    /// The duration is fixed once known; a later different value is ignored.
    pub fn set_duration(&mut self, duration: f64) -> TrimcropResult<TimeRange> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(TrimcropError::load_failure(format!(
                "invalid media duration: {duration}"
            )));
        }
        if let (Some(known), Some(range)) = (self.duration, self.range) {
            if (known - duration).abs() > f64::EPSILON {
                tracing::warn!(known, reported = duration, "duration already fixed, ignoring");
            }
            return Ok(range);
        }

        let range = TimeRange::full(duration);
        self.duration = Some(duration);
        self.range = Some(range);
        self.current_time = self.current_time.clamp(0.0, duration);
        tracing::debug!(duration, "media duration known");
        Ok(range)
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn range(&self) -> Option<TimeRange> {
        self.range
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn min_span(&self) -> f64 {
        self.min_span
    }

    /// Move the playhead, confined to the trim range.
    ///
    /// While playing, a time outside the range snaps to the range start
    /// instead of the nearest bound. Returns the applied time.
    pub fn seek(&mut self, time: f64) -> f64 {
        let time = if time.is_finite() { time } else { 0.0 };
        self.current_time = match self.range {
            None => time.max(0.0),
            Some(range) if self.is_playing() && !range.contains(time) => range.start,
            Some(range) => range.clamp(time),
        };
        tracing::trace!(requested = time, applied = self.current_time, "seek");
        self.current_time
    }

    /// Seek to the time under a pointer click on the timeline strip.
    pub fn seek_fraction(&mut self, frame: &ReferenceFrame, point: Point) -> TrimcropResult<f64> {
        let duration = self.duration.ok_or(TrimcropError::DurationUnknown)?;
        let (fraction, _) = frame.fraction(point);
        Ok(self.seek(fraction * duration))
    }

    /// Toggle between playing and paused.
    ///
    /// Playback resumes from the playhead, or from the range start when
    /// the playhead sits before it. Pausing keeps the playhead in place.
    pub fn toggle_play(&mut self) -> ToggleOutcome {
        match self.state {
            PlaybackState::Playing => {
                self.state = PlaybackState::Stopped;
                tracing::debug!(time = self.current_time, "playback paused");
                ToggleOutcome {
                    state: self.state,
                    seek_to: None,
                }
            }
            PlaybackState::Stopped => {
                let mut seek_to = None;
                if let Some(range) = self.range {
                    if self.current_time < range.start {
                        self.current_time = range.start;
                        seek_to = Some(range.start);
                    }
                }
                self.state = PlaybackState::Playing;
                tracing::debug!(time = self.current_time, "playback started");
                ToggleOutcome {
                    state: self.state,
                    seek_to,
                }
            }
        }
    }

    /// Force the transport into `state` (e.g. the surface refused to play).
    pub fn set_state(&mut self, state: PlaybackState) {
        self.state = state;
    }

    /// Apply a position report from the media surface.
    ///
    /// Reaching the range end loops back to the start; while playing, a
    /// position before the start is pulled up to it. Returns the seek the
    /// surface must perform when the position was corrected.
    pub fn on_tick(&mut self, reported: f64) -> Option<f64> {
        self.current_time = reported;
        let range = self.range?;

        if reported >= range.end {
            self.current_time = range.start;
            tracing::trace!(reported, start = range.start, "wrapped to range start");
            return Some(range.start);
        }
        if reported < range.start && self.is_playing() {
            self.current_time = range.start;
            return Some(range.start);
        }
        None
    }

    /// Move one range handle to `raw` seconds.
    ///
    /// Out-of-range values are clamped, and the handle stops at the
    /// minimum span from the other bound. Moving the start past the
    /// playhead while playing re-seeks to the new start; while stopped the
    /// playhead follows the start handle as a preview. Returns the seek
    /// the surface must perform, if any.
    pub fn set_range_handle(&mut self, which: RangeBound, raw: f64) -> TrimcropResult<Option<f64>> {
        let duration = self.duration.ok_or(TrimcropError::DurationUnknown)?;
        let current = self.range.unwrap_or_else(|| TimeRange::full(duration));
        let next = current.with_bound(which, raw, duration, self.min_span);
        if (next.bound(which) - raw).abs() > TIME_EPSILON {
            tracing::trace!(?which, raw, applied = next.bound(which), "handle corrected");
        }
        self.range = Some(next);

        if which != RangeBound::Start {
            return Ok(None);
        }
        let playhead_moves = match self.state {
            PlaybackState::Playing => self.current_time < next.start,
            PlaybackState::Stopped => true,
        };
        if playhead_moves {
            self.current_time = next.start;
            return Ok(Some(next.start));
        }
        Ok(None)
    }

    /// Begin dragging a range handle.
    pub fn begin_handle_drag(
        &mut self,
        drag: &mut DragEngine,
        which: RangeBound,
        frame: ReferenceFrame,
        point: Point,
    ) -> TrimcropResult<DragHandle> {
        if self.duration.is_none() {
            return Err(TrimcropError::DurationUnknown);
        }
        drag.begin(DragTarget::for_bound(which), frame, point)
    }

    /// Follow the pointer of a handle drag.
    pub fn drag_handle(
        &mut self,
        drag: &mut DragEngine,
        handle: &DragHandle,
        point: Point,
    ) -> TrimcropResult<Option<f64>> {
        let which = handle
            .target()
            .range_bound()
            .ok_or(TrimcropError::NoActiveDrag)?;
        let update = drag.update(handle, point)?;
        let duration = self.duration.ok_or(TrimcropError::DurationUnknown)?;
        self.set_range_handle(which, update.position() * duration)
    }

    /// Release a handle drag; the range keeps the last applied position.
    pub fn end_handle_drag(
        &mut self,
        drag: &mut DragEngine,
        handle: DragHandle,
    ) -> TrimcropResult<TimeRange> {
        let update = drag.end(handle)?;
        let duration = self.duration.ok_or(TrimcropError::DurationUnknown)?;
        if let Some(which) = update.target.range_bound() {
            self.set_range_handle(which, update.position() * duration)?;
        }
        self.range.ok_or(TrimcropError::DurationUnknown)
    }
}
