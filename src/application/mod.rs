//! Application layer - Use cases and port interfaces
//!
//! Contains the compositor workflows, the generation services, and the
//! trait definitions for external system interactions.

pub mod crop;
pub mod error;
pub mod fallback;
pub mod generation;
pub mod guard;
pub mod multiplexer;
pub mod pipeline;
pub mod ports;
pub mod stitch;

// Re-export use cases
pub use crop::{CropRequest, CropVideoUseCase};
pub use error::CompositeError;
pub use fallback::ProviderChain;
pub use generation::{ScriptService, SpeechService, StoryService, VideoGenerationService};
pub use guard::{DeadlineGuard, Releasable, Teardown};
pub use multiplexer::StreamMultiplexer;
pub use pipeline::RecordingPipeline;
pub use stitch::{CompositorOptions, StitchFramesUseCase, StitchRequest};
