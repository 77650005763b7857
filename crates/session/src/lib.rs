//! Trimcrop Session
//!
//! The editing session is the composition root for one loaded clip. It
//! owns playback, the trim range, the crop selection, the live drag and the
//! conversion job, and exposes everything the presentation layer renders as
//! a serializable [`SessionView`].

pub mod resolver;
pub mod session;

pub use resolver::{FsMediaResolver, MediaResolver};
pub use session::{EditingSession, SessionPhase, SessionView};
