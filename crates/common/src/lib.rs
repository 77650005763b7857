//! Trimcrop Common Utilities
//!
//! Shared infrastructure for all Trimcrop crates:
//! - Error types and result aliases
//! - Stopwatch for job timing
//! - Tracing/logging initialization and the fire-and-forget event log
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
