//! Rubber-band crop selection over the preview surface.

use trimcrop_common::error::{TrimcropError, TrimcropResult};
use trimcrop_session_model::crop::{CropRect, DEFAULT_MIN_CROP_PERCENT};

use crate::drag::{DragEngine, DragHandle, DragTarget, Point, ReferenceFrame};

/// Owns the session's crop rectangle and the selection in progress.
#[derive(Debug, Clone)]
pub struct CropSelector {
    crop: CropRect,
    enabled: bool,
    preview: Option<CropRect>,
    min_crop_percent: f64,
}

impl Default for CropSelector {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CROP_PERCENT)
    }
}

impl CropSelector {
    pub fn new(min_crop_percent: f64) -> Self {
        Self {
            crop: CropRect::FULL,
            enabled: false,
            preview: None,
            min_crop_percent,
        }
    }

    /// Begin a selection at `point`.
    ///
    /// The live rectangle starts with zero area at the pointer so the
    /// selection is visible immediately.
    pub fn start_selection(
        &mut self,
        drag: &mut DragEngine,
        frame: ReferenceFrame,
        point: Point,
    ) -> TrimcropResult<DragHandle> {
        if !self.enabled {
            return Err(TrimcropError::CropModeDisabled);
        }
        let handle = drag.begin(DragTarget::Crop, frame, point)?;
        let (fx, fy) = frame.fraction(point);
        self.preview = Some(CropRect::point(fx * 100.0, fy * 100.0));
        Ok(handle)
    }

    /// Follow the pointer; returns the live rectangle.
    pub fn update_selection(
        &mut self,
        drag: &mut DragEngine,
        handle: &DragHandle,
        point: Point,
    ) -> TrimcropResult<CropRect> {
        let rect = drag.update(handle, point)?.rect_percent();
        self.preview = Some(rect);
        Ok(rect)
    }

    /// Finish the selection and make it the active crop.
    ///
    /// A rectangle thinner than the minimum side reverts to full frame.
    pub fn commit_selection(
        &mut self,
        drag: &mut DragEngine,
        handle: DragHandle,
    ) -> TrimcropResult<CropRect> {
        let raw = drag.end(handle)?.rect_percent();
        self.preview = None;
        self.crop = raw.normalized(self.min_crop_percent);
        if self.crop.is_full_frame() && !raw.is_full_frame() {
            tracing::debug!(width = raw.width, height = raw.height, "selection too small, crop cleared");
        } else {
            tracing::debug!(crop = ?self.crop, "crop committed");
        }
        Ok(self.crop)
    }

    /// Set the active crop directly (numeric entry).
    pub fn set_crop(&mut self, rect: CropRect) -> CropRect {
        self.crop = CropRect::new(rect.x, rect.y, rect.width, rect.height)
            .normalized(self.min_crop_percent);
        self.crop
    }

    /// Drop the active crop.
    pub fn reset(&mut self) {
        self.crop = CropRect::FULL;
        self.preview = None;
    }

    /// Enable or disable crop mode.
    ///
    /// Disabling only blocks new selections; a live drag may still commit.
    pub fn toggle_mode(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Committed rectangle, regardless of crop mode.
    pub fn crop(&self) -> CropRect {
        self.crop
    }

    /// Rectangle of the selection in progress.
    pub fn preview(&self) -> Option<CropRect> {
        self.preview
    }

    /// Crop to export: full frame while crop mode is off.
    pub fn effective_crop(&self) -> CropRect {
        if self.enabled {
            self.crop
        } else {
            CropRect::FULL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn frame() -> ReferenceFrame {
        ReferenceFrame::new(0.0, 0.0, 200.0, 100.0)
    }

    fn enabled() -> CropSelector {
        let mut selector = CropSelector::default();
        selector.toggle_mode(true);
        selector
    }

    #[test]
    fn test_disabled_mode_rejects_selection() {
        let mut selector = CropSelector::default();
        let mut drag = DragEngine::new();
        let err = selector
            .start_selection(&mut drag, frame(), Point::new(10.0, 10.0))
            .unwrap_err();
        assert!(matches!(err, TrimcropError::CropModeDisabled));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_selection_starts_degenerate() {
        let mut selector = enabled();
        let mut drag = DragEngine::new();
        selector
            .start_selection(&mut drag, frame(), Point::new(50.0, 25.0))
            .unwrap();
        let preview = selector.preview().unwrap();
        assert_eq!((preview.x, preview.y), (25.0, 25.0));
        assert_eq!((preview.width, preview.height), (0.0, 0.0));
    }

    #[test]
    fn test_commit_sets_crop() {
        let mut selector = enabled();
        let mut drag = DragEngine::new();
        let handle = selector
            .start_selection(&mut drag, frame(), Point::new(150.0, 80.0))
            .unwrap();
        selector
            .update_selection(&mut drag, &handle, Point::new(20.0, 10.0))
            .unwrap();
        let crop = selector.commit_selection(&mut drag, handle).unwrap();

        assert!((crop.x - 10.0).abs() < 1e-9);
        assert!((crop.y - 10.0).abs() < 1e-9);
        assert!((crop.width - 65.0).abs() < 1e-9);
        assert!((crop.height - 70.0).abs() < 1e-9);
        assert_eq!(selector.effective_crop(), crop);
        assert!(selector.preview().is_none());
    }

    #[test]
    fn test_tiny_selection_reverts_to_full_frame() {
        let mut selector = enabled();
        let mut drag = DragEngine::new();
        let handle = selector
            .start_selection(&mut drag, frame(), Point::new(100.0, 50.0))
            .unwrap();
        selector
            .update_selection(&mut drag, &handle, Point::new(100.5, 90.0))
            .unwrap();
        let crop = selector.commit_selection(&mut drag, handle).unwrap();
        assert!(crop.is_full_frame());
    }

    #[test]
    fn test_disable_does_not_interrupt_live_drag() {
        let mut selector = enabled();
        let mut drag = DragEngine::new();
        let handle = selector
            .start_selection(&mut drag, frame(), Point::new(0.0, 0.0))
            .unwrap();
        selector.toggle_mode(false);
        selector
            .update_selection(&mut drag, &handle, Point::new(100.0, 50.0))
            .unwrap();
        let crop = selector.commit_selection(&mut drag, handle).unwrap();

        assert!((crop.width - 50.0).abs() < 1e-9);
        assert!(selector.effective_crop().is_full_frame());
        assert!(selector
            .start_selection(&mut drag, frame(), Point::new(0.0, 0.0))
            .is_err());
    }

    #[test]
    fn test_reset_forces_full_frame() {
        let mut selector = enabled();
        let mut drag = DragEngine::new();
        let handle = selector
            .start_selection(&mut drag, frame(), Point::new(0.0, 0.0))
            .unwrap();
        selector
            .update_selection(&mut drag, &handle, Point::new(100.0, 50.0))
            .unwrap();
        selector.commit_selection(&mut drag, handle).unwrap();
        selector.reset();
        assert!(selector.crop().is_full_frame());
    }

    #[test]
    fn test_set_crop_clamps_and_normalizes() {
        let mut selector = enabled();
        let crop = selector.set_crop(CropRect {
            x: 80.0,
            y: 10.0,
            width: 50.0,
            height: 40.0,
        });
        assert_eq!(crop.right(), 100.0);
        assert!(selector.set_crop(CropRect::new(5.0, 5.0, 0.5, 50.0)).is_full_frame());
    }

    proptest! {
        #[test]
        fn prop_committed_crop_stays_in_frame(
            ox in -50.0f64..250.0, oy in -50.0f64..150.0,
            px in -50.0f64..250.0, py in -50.0f64..150.0,
        ) {
            let mut selector = enabled();
            let mut drag = DragEngine::new();
            let handle = selector.start_selection(&mut drag, frame(), Point::new(ox, oy)).unwrap();
            selector.update_selection(&mut drag, &handle, Point::new(px, py)).unwrap();
            let crop = selector.commit_selection(&mut drag, handle).unwrap();

            prop_assert!(crop.x + crop.width <= 100.0 + 1e-9);
            prop_assert!(crop.y + crop.height <= 100.0 + 1e-9);
            prop_assert!(crop.is_full_frame() || (crop.width >= 1.0 && crop.height >= 1.0));
        }
    }
}
