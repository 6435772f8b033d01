//! Recording domain module

mod duration;
mod session;

pub use duration::{
    Duration, DEFAULT_CROP_TIMEOUT_SECS, DEFAULT_IMAGE_DURATION_MS, DEFAULT_STITCH_TIMEOUT_SECS,
};
pub use session::{InvalidStateTransition, RecordingSession, SessionState};
