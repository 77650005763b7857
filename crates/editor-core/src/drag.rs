//! Generic pointer-drag interactions.
//!
//! The range handles and the crop surface share this engine. A drag lives
//! from pointer-down to pointer-up on one target; at most one drag is live
//! at a time. The engine converts pointer positions into fractions of a
//! reference frame and hands normalized results back to the caller, which
//! owns all session state.

use serde::{Deserialize, Serialize};
use trimcrop_common::error::{TrimcropError, TrimcropResult};
use trimcrop_session_model::crop::CropRect;
use trimcrop_session_model::range::RangeBound;

/// What is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DragTarget {
    StartHandle,
    EndHandle,
    Crop,
}

impl DragTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StartHandle => "start-handle",
            Self::EndHandle => "end-handle",
            Self::Crop => "crop",
        }
    }

    /// The range bound a handle target controls.
    pub fn range_bound(self) -> Option<RangeBound> {
        match self {
            Self::StartHandle => Some(RangeBound::Start),
            Self::EndHandle => Some(RangeBound::End),
            Self::Crop => None,
        }
    }

    pub fn for_bound(bound: RangeBound) -> Self {
        match bound {
            RangeBound::Start => Self::StartHandle,
            RangeBound::End => Self::EndHandle,
        }
    }
}

/// A pointer position in screen/client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// On-screen bounds pointer positions are measured against
/// (the timeline strip or the crop container).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFrame {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ReferenceFrame {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A one-dimensional strip; only the x axis is meaningful.
    pub fn strip(left: f64, width: f64) -> Self {
        Self::new(left, 0.0, width, 0.0)
    }

    /// Position of `point` as fractions of the frame, clamped to `[0, 1]`.
    ///
    /// A degenerate axis maps to `0`.
    pub fn fraction(&self, point: Point) -> (f64, f64) {
        (
            axis_fraction(point.x, self.left, self.width),
            axis_fraction(point.y, self.top, self.height),
        )
    }
}

fn axis_fraction(value: f64, origin: f64, extent: f64) -> f64 {
    if !(extent > 0.0) || !value.is_finite() {
        return 0.0;
    }
    ((value - origin) / extent).clamp(0.0, 1.0)
}

/// Proof of a live drag, returned by [`DragEngine::begin`].
#[derive(Debug, PartialEq, Eq)]
pub struct DragHandle {
    id: u64,
    target: DragTarget,
}

impl DragHandle {
    pub fn target(&self) -> DragTarget {
        self.target
    }
}

/// Normalized state of a drag after an update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragUpdate {
    pub target: DragTarget,
    /// Pointer-down position as frame fractions.
    pub origin: (f64, f64),
    /// Latest pointer position as frame fractions.
    pub current: (f64, f64),
}

impl DragUpdate {
    /// Horizontal position of the pointer in `[0, 1]`.
    pub fn position(&self) -> f64 {
        self.current.0
    }

    /// Horizontal span between origin and pointer, ordered `lo <= hi`.
    pub fn range(&self) -> (f64, f64) {
        let (a, b) = (self.origin.0, self.current.0);
        (a.min(b), a.max(b))
    }

    /// Rectangle between origin and pointer in percent, in any drag direction.
    pub fn rect_percent(&self) -> CropRect {
        CropRect::from_corners(
            (self.origin.0 * 100.0, self.origin.1 * 100.0),
            (self.current.0 * 100.0, self.current.1 * 100.0),
        )
    }
}

#[derive(Debug)]
struct LiveDrag {
    id: u64,
    target: DragTarget,
    frame: ReferenceFrame,
    origin: (f64, f64),
    current: (f64, f64),
}

impl LiveDrag {
    fn snapshot(&self) -> DragUpdate {
        DragUpdate {
            target: self.target,
            origin: self.origin,
            current: self.current,
        }
    }
}

/// Exclusive drag state machine.
#[derive(Debug, Default)]
pub struct DragEngine {
    live: Option<LiveDrag>,
    next_id: u64,
}

impl DragEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a drag on `target` at `origin`.
    ///
    /// Fails with `AlreadyDragging` while another drag is live.
    pub fn begin(
        &mut self,
        target: DragTarget,
        frame: ReferenceFrame,
        origin: Point,
    ) -> TrimcropResult<DragHandle> {
        if let Some(live) = &self.live {
            return Err(TrimcropError::already_dragging(live.target.as_str()));
        }

        self.next_id += 1;
        let origin = frame.fraction(origin);
        self.live = Some(LiveDrag {
            id: self.next_id,
            target,
            frame,
            origin,
            current: origin,
        });
        tracing::trace!(target = target.as_str(), ?origin, "drag started");

        Ok(DragHandle {
            id: self.next_id,
            target,
        })
    }

    /// Move the pointer of the live drag.
    pub fn update(&mut self, handle: &DragHandle, point: Point) -> TrimcropResult<DragUpdate> {
        let live = self.live_for(handle)?;
        live.current = live.frame.fraction(point);
        Ok(live.snapshot())
    }

    /// Finish the live drag and return its final state.
    pub fn end(&mut self, handle: DragHandle) -> TrimcropResult<DragUpdate> {
        self.live_for(&handle)?;
        let live = self.live.take().ok_or(TrimcropError::NoActiveDrag)?;
        tracing::trace!(target = live.target.as_str(), current = ?live.current, "drag ended");
        Ok(live.snapshot())
    }

    /// Drop any live drag without committing (session teardown).
    pub fn cancel(&mut self) -> Option<DragTarget> {
        self.live.take().map(|live| live.target)
    }

    /// Target of the live drag, if any.
    pub fn live_target(&self) -> Option<DragTarget> {
        self.live.as_ref().map(|live| live.target)
    }

    pub fn is_dragging(&self) -> bool {
        self.live.is_some()
    }

    fn live_for(&mut self, handle: &DragHandle) -> TrimcropResult<&mut LiveDrag> {
        match self.live.as_mut() {
            Some(live) if live.id == handle.id => Ok(live),
            _ => Err(TrimcropError::NoActiveDrag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> ReferenceFrame {
        ReferenceFrame::new(100.0, 50.0, 400.0, 200.0)
    }

    #[test]
    fn test_fraction_clamps() {
        let f = frame();
        assert_eq!(f.fraction(Point::new(300.0, 150.0)), (0.5, 0.5));
        assert_eq!(f.fraction(Point::new(0.0, 1000.0)), (0.0, 1.0));
        assert_eq!(ReferenceFrame::strip(0.0, 0.0).fraction(Point::new(5.0, 5.0)), (0.0, 0.0));
    }

    #[test]
    fn test_second_begin_fails_until_end() {
        let mut engine = DragEngine::new();
        let handle = engine
            .begin(DragTarget::StartHandle, frame(), Point::new(100.0, 50.0))
            .unwrap();
        let err = engine
            .begin(DragTarget::Crop, frame(), Point::new(200.0, 100.0))
            .unwrap_err();
        assert!(matches!(err, TrimcropError::AlreadyDragging { ref target } if target == "start-handle"));

        engine.end(handle).unwrap();
        assert!(engine
            .begin(DragTarget::Crop, frame(), Point::new(200.0, 100.0))
            .is_ok());
    }

    #[test]
    fn test_update_normalizes_reverse_drag() {
        let mut engine = DragEngine::new();
        let handle = engine
            .begin(DragTarget::Crop, frame(), Point::new(400.0, 200.0))
            .unwrap();
        let update = engine.update(&handle, Point::new(200.0, 100.0)).unwrap();

        assert_eq!(update.range(), (0.25, 0.75));
        let rect = update.rect_percent();
        assert!((rect.x - 25.0).abs() < 1e-9);
        assert!((rect.y - 25.0).abs() < 1e-9);
        assert!((rect.width - 50.0).abs() < 1e-9);
        assert!((rect.height - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let mut engine = DragEngine::new();
        let first = engine
            .begin(DragTarget::EndHandle, frame(), Point::new(100.0, 50.0))
            .unwrap();
        let stale = DragHandle {
            id: first.id,
            target: first.target,
        };
        engine.end(first).unwrap();
        let _second = engine
            .begin(DragTarget::EndHandle, frame(), Point::new(100.0, 50.0))
            .unwrap();

        assert!(matches!(
            engine.update(&stale, Point::new(0.0, 0.0)),
            Err(TrimcropError::NoActiveDrag)
        ));
    }

    #[test]
    fn test_cancel_releases_exclusivity() {
        let mut engine = DragEngine::new();
        let _handle = engine
            .begin(DragTarget::Crop, frame(), Point::new(100.0, 50.0))
            .unwrap();
        assert_eq!(engine.cancel(), Some(DragTarget::Crop));
        assert!(!engine.is_dragging());
        assert_eq!(engine.live_target(), None);
    }
}
