//! Trim range type.
//!
//! All times are seconds from the start of the clip.

use serde::{Deserialize, Serialize};
use trimcrop_common::error::{TrimcropError, TrimcropResult};

/// Default minimum distance between the two range handles (seconds).
pub const DEFAULT_MIN_SPAN_SECS: f64 = 0.5;

/// Tolerance used when comparing range bounds against clip bounds.
pub const TIME_EPSILON: f64 = 1e-6;

/// Which boundary of the trim range a handle controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeBound {
    Start,
    End,
}

/// The selected `[start, end]` sub-interval of the clip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    /// A range covering the whole clip.
    pub fn full(duration: f64) -> Self {
        Self {
            start: 0.0,
            end: duration.max(0.0),
        }
    }

    /// Create a range, rejecting spans shorter than `min_span`.
    pub fn try_new(start: f64, end: f64, min_span: f64) -> TrimcropResult<Self> {
        if !start.is_finite() || !end.is_finite() || start < 0.0 || end - start < min_span {
            return Err(TrimcropError::InvalidRange {
                start,
                end,
                min_span,
            });
        }
        Ok(Self { start, end })
    }

    /// Length of the range in seconds.
    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    /// Check if a time lies within the range (inclusive).
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }

    /// Clamp a time into the range.
    pub fn clamp(&self, t: f64) -> f64 {
        t.clamp(self.start, self.end)
    }

    /// Whether the range starts at the beginning of the clip.
    pub fn starts_at_zero(&self) -> bool {
        self.start <= TIME_EPSILON
    }

    /// Whether the range reaches the end of a clip of `duration` seconds.
    pub fn reaches_end(&self, duration: f64) -> bool {
        self.end >= duration - TIME_EPSILON
    }

    /// Whether the range spans the whole clip.
    pub fn covers(&self, duration: f64) -> bool {
        self.starts_at_zero() && self.reaches_end(duration)
    }

    /// Bound value by handle.
    pub fn bound(&self, which: RangeBound) -> f64 {
        match which {
            RangeBound::Start => self.start,
            RangeBound::End => self.end,
        }
    }

    /// Move one bound to `raw`, keeping it within `[0, duration]` and at
    /// least `min_span` away from the other bound.
    ///
    /// The moved handle snaps to the minimum gap instead of crossing it.
    pub fn with_bound(&self, which: RangeBound, raw: f64, duration: f64, min_span: f64) -> Self {
        let raw = if raw.is_finite() { raw } else { 0.0 };
        let raw = raw.clamp(0.0, duration.max(0.0));
        match which {
            RangeBound::Start => Self {
                start: raw.min(self.end - min_span).max(0.0),
                end: self.end,
            },
            RangeBound::End => Self {
                start: self.start,
                end: raw.max(self.start + min_span).min(duration.max(0.0)),
            },
        }
    }
}
