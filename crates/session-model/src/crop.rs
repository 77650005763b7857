//! Crop rectangle types.
//!
//! All coordinates are percentages in `[0.0, 100.0]` of the source frame.

use serde::{Deserialize, Serialize};

/// Smallest side (percent) a committed crop may have before it is
/// treated as "no crop".
pub const DEFAULT_MIN_CROP_PERCENT: f64 = 1.0;

/// A rectangular crop region within the source frame.
///
/// `(0, 0)` is top-left, `(100, 100)` is bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    /// Left edge (percent).
    pub x: f64,
    /// Top edge (percent).
    pub y: f64,
    /// Width (percent).
    pub width: f64,
    /// Height (percent).
    pub height: f64,
}

impl CropRect {
    /// Full-frame crop (no cropping).
    pub const FULL: CropRect = CropRect {
        x: 0.0,
        y: 0.0,
        width: 100.0,
        height: 100.0,
    };

    /// Create a rectangle clamped to the frame.
    ///
    /// The origin is clamped to `[0, 100]` and the size shrunk so the
    /// rectangle never extends past the right or bottom edge.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        let x = clamp_percent(x);
        let y = clamp_percent(y);
        Self {
            x,
            y,
            width: clamp_percent(width).min(100.0 - x),
            height: clamp_percent(height).min(100.0 - y),
        }
    }

    /// Rectangle spanned by two corner points, regardless of drag direction.
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        let (ax, ay) = (clamp_percent(a.0), clamp_percent(a.1));
        let (bx, by) = (clamp_percent(b.0), clamp_percent(b.1));
        Self::new(ax.min(bx), ay.min(by), (bx - ax).abs(), (by - ay).abs())
    }

    /// Zero-area rectangle at a point, used as immediate drag feedback.
    pub fn point(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0, 0.0)
    }

    /// Clamp to the frame and revert degenerate rectangles to full frame.
    pub fn normalized(self, min_side: f64) -> Self {
        let rect = Self::new(self.x, self.y, self.width, self.height);
        if rect.width < min_side || rect.height < min_side {
            Self::FULL
        } else {
            rect
        }
    }

    /// Whether this rectangle keeps the whole frame.
    pub fn is_full_frame(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.width == 100.0 && self.height == 100.0
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether the rectangle lies entirely within the frame.
    pub fn is_within_frame(&self) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width >= 0.0
            && self.height >= 0.0
            && self.right() <= 100.0 + 1e-9
            && self.bottom() <= 100.0 + 1e-9
    }

    /// Convert to a pixel rectangle for a frame of `frame_w x frame_h`.
    pub fn to_pixels(&self, frame_w: u32, frame_h: u32) -> PixelRect {
        let fw = frame_w as f64;
        let fh = frame_h as f64;
        PixelRect {
            x: (self.x / 100.0 * fw).round() as u32,
            y: (self.y / 100.0 * fh).round() as u32,
            width: (self.width / 100.0 * fw).round() as u32,
            height: (self.height / 100.0 * fh).round() as u32,
        }
    }
}

impl Default for CropRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// A crop rectangle in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

fn clamp_percent(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 100.0)
    }
}
