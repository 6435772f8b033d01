//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod audio;
pub mod config;
pub mod encoder;
pub mod generation;
pub mod media;

// Re-export common types
pub use audio::{
    AudioContext, AudioContextFactory, AudioContextState, AudioPrepError, AudioPreparer,
    AudioRouting,
};
pub use config::ConfigStore;
pub use encoder::{EncoderError, EncoderSession, MediaEncoder, RecorderState};
pub use generation::{
    GenerationError, ImageGenerator, ScriptGenerator, SpeechSynthesizer, StoryGenerator,
    VideoGenerator,
};
pub use media::{LoadedImage, MediaLoadError, MediaLoader, PlaybackError, VideoSource};
