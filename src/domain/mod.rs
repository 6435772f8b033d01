//! Domain layer - Core compositing logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod composition;
pub mod config;
pub mod error;
pub mod generation;
pub mod media;
pub mod output;
pub mod recording;

// Re-export common types
pub use composition::{cover_fit, CompositionPlan, Dimensions, FrameRate, Placement, SlideSchedule};
pub use config::AppConfig;
pub use error::*;
pub use media::{AudioTrack, Canvas, MediaKind, MediaOrigin, MediaSource};
pub use output::{CompositeAsset, EncodingFormat, ObjectUrlRegistry, OutputStream};
pub use recording::Duration;
