//! Trimcrop Editor Core
//!
//! State machines behind the interactive editor:
//! - **Drag:** One generic pointer-drag engine shared by every draggable target
//! - **Timeline:** Play/pause and seeking confined to the trim range
//! - **Crop:** Rubber-band selection of the crop rectangle
//!
//! This crate is pure computation. The media surface reports playback
//! position; methods return the seeks it should perform.

pub mod crop;
pub mod drag;
pub mod timeline;

pub use crop::CropSelector;
pub use drag::{DragEngine, DragHandle, DragTarget, DragUpdate, Point, ReferenceFrame};
pub use timeline::{PlaybackController, PlaybackState, ToggleOutcome};
