//! Trimcrop Session Model
//!
//! Defines the value types shared by the editor and the conversion engine:
//! - **Range:** The trim window `[start, end]` in seconds
//! - **Crop:** Percentage-based crop rectangles (full frame = no crop)
//! - **Request:** Frozen session snapshots and the engine wire request
//! - **Job:** Conversion job status and failure reasons
//!
//! Crop coordinates are percentages in `[0, 100]` of the source frame so
//! they are independent of the preview's on-screen size.

pub mod crop;
pub mod job;
pub mod range;
pub mod request;

pub use crop::*;
pub use job::*;
pub use range::*;
pub use request::*;
