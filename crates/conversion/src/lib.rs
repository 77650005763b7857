//! Trimcrop Conversion
//!
//! Everything between a frozen [`ConversionRequest`] and its outcome:
//!
//! ```text
//! SessionSnapshot ──► JobOrchestrator::submit ──► ConversionEngine::convert
//!                            ▲                         │
//!                            │   EngineEvent channel   │
//!                            └── Progress(p) ◄─────────┤
//!                            └── Finished(reply) ◄─────┘
//! ```
//!
//! The orchestrator enforces one live job per session and a non-decreasing
//! progress signal. [`FfmpegEngine`] is the production engine; it probes the
//! source, plans a bitrate for the target size and runs a two-pass encode.
//!
//! [`ConversionRequest`]: trimcrop_session_model::ConversionRequest

pub mod bitrate;
pub mod debounce;
pub mod engine;
pub mod ffmpeg;
pub mod orchestrator;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;

pub use debounce::DebouncedTrigger;
pub use engine::{ConversionEngine, ConversionReply, EngineEvent, ProgressSink};
pub use ffmpeg::{FfmpegEngine, MediaProbe};
pub use orchestrator::JobOrchestrator;
#[cfg(any(test, feature = "testing"))]
pub use scripted::{ScriptedEngine, ScriptedOutcome};
