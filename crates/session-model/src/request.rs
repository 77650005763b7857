//! Session snapshots and the conversion request sent to the engine.
//!
//! The request serializes to the engine's wire shape:
//!
//! ```text
//! { "input": "<media-ref>", "targetSize": 8,
//!   "startTime": 10.0, "endTime": 50.0,
//!   "crop": { "x": 10, "y": 10, "width": 50, "height": 50, "unit": "%" } }
//! ```
//!
//! Optional fields are omitted rather than sent as `null`.

use serde::{Deserialize, Serialize};

use crate::crop::CropRect;
use crate::range::TimeRange;

/// Opaque handle to the loaded source media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Path handed to the conversion engine.
    pub path: String,

    /// URL the preview surface plays from.
    pub playable_url: String,

    /// MIME type guessed from the file extension.
    pub mime_type: String,
}

impl SourceRef {
    /// A source whose preview URL and MIME type are not needed.
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            playable_url: path.clone(),
            mime_type: String::new(),
            path,
        }
    }
}

/// Immutable capture of the session state an export is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub source: SourceRef,
    /// Clip duration, once the preview surface has reported it.
    pub duration: Option<f64>,
    /// Trim range; meaningful only when `duration` is known.
    pub range: Option<TimeRange>,
    pub crop: CropRect,
    pub target_size_mb: u32,
}

/// Crop as carried on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropSpec {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub unit: String,
}

impl CropSpec {
    pub const PERCENT_UNIT: &'static str = "%";

    pub fn from_rect(rect: &CropRect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            unit: Self::PERCENT_UNIT.to_string(),
        }
    }

    /// The rectangle this spec describes, clamped to the frame.
    pub fn to_rect(&self) -> CropRect {
        CropRect::new(self.x, self.y, self.width, self.height)
    }
}

/// Request consumed by the conversion engine, frozen at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    /// Source media reference.
    pub input: String,

    /// Target output size in megabytes.
    pub target_size: u32,

    /// Trim start; absent means the beginning of the clip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,

    /// Trim end; absent means the end of the clip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,

    /// Crop region; absent means full frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropSpec>,
}

impl ConversionRequest {
    /// Freeze a request from a session snapshot.
    ///
    /// Range bounds that coincide with the clip bounds are omitted, so a
    /// full-duration range sends neither; a full-frame crop is omitted.
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        let (start_time, end_time) = match (snapshot.duration, snapshot.range) {
            (Some(duration), Some(range)) => (
                (!range.starts_at_zero()).then_some(range.start),
                (!range.reaches_end(duration)).then_some(range.end),
            ),
            _ => (None, None),
        };

        let crop = (!snapshot.crop.is_full_frame()).then(|| CropSpec::from_rect(&snapshot.crop));

        Self {
            input: snapshot.source.path.clone(),
            target_size: snapshot.target_size_mb,
            start_time,
            end_time,
            crop,
        }
    }

    /// Length of the output in seconds for a clip of `clip_duration`.
    pub fn output_duration(&self, clip_duration: f64) -> f64 {
        let start = self.start_time.unwrap_or(0.0).max(0.0);
        let end = self.end_time.unwrap_or(clip_duration).min(clip_duration);
        (end - start).max(0.0)
    }

    /// Whether any trimming was requested.
    pub fn is_trimmed(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(range: TimeRange, crop: CropRect) -> SessionSnapshot {
        SessionSnapshot {
            source: SourceRef::from_path("/videos/clip.mp4"),
            duration: Some(120.0),
            range: Some(range),
            crop,
            target_size_mb: 8,
        }
    }

    #[test]
    fn test_request_includes_partial_range_and_omits_full_crop() {
        let snap = snapshot(TimeRange { start: 10.0, end: 50.0 }, CropRect::FULL);
        let request = ConversionRequest::from_snapshot(&snap);
        assert_eq!(request.start_time, Some(10.0));
        assert_eq!(request.end_time, Some(50.0));
        assert!(request.crop.is_none());

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["startTime"], 10.0);
        assert_eq!(json["endTime"], 50.0);
        assert_eq!(json["targetSize"], 8);
        assert!(json.get("crop").is_none());
    }

    #[test]
    fn test_full_range_is_omitted() {
        let request =
            ConversionRequest::from_snapshot(&snapshot(TimeRange::full(120.0), CropRect::FULL));
        assert!(!request.is_trimmed());
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"input":"/videos/clip.mp4","targetSize":8}"#);
    }

    #[test]
    fn test_bounds_are_omitted_independently() {
        let request = ConversionRequest::from_snapshot(&snapshot(
            TimeRange { start: 0.0, end: 30.0 },
            CropRect::FULL,
        ));
        assert_eq!(request.start_time, None);
        assert_eq!(request.end_time, Some(30.0));
        assert!((request.output_duration(120.0) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_crop_is_sent_in_percent() {
        let crop = CropRect::new(10.0, 20.0, 30.0, 40.0);
        let request = ConversionRequest::from_snapshot(&snapshot(TimeRange::full(120.0), crop));
        let spec = request.crop.clone().unwrap();
        assert_eq!(spec.unit, "%");
        assert_eq!(spec.to_rect(), crop);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["crop"]["width"], 30.0);
        assert_eq!(json["crop"]["unit"], "%");
    }

    #[test]
    fn test_unknown_duration_sends_no_range() {
        let mut snap = snapshot(TimeRange { start: 5.0, end: 10.0 }, CropRect::FULL);
        snap.duration = None;
        let request = ConversionRequest::from_snapshot(&snap);
        assert!(!request.is_trimmed());
    }

    #[test]
    fn test_wire_request_deserializes_with_missing_optionals() {
        let request: ConversionRequest =
            serde_json::from_str(r#"{"input":"a.mp4","targetSize":25}"#).unwrap();
        assert_eq!(request.target_size, 25);
        assert!(request.crop.is_none());
        assert_eq!(request.output_duration(12.0), 12.0);
    }
}
