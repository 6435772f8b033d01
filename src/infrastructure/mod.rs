//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with external systems like FFmpeg, rodio, Gemini, etc.

pub mod audio;
pub mod config;
pub mod encoder;
pub mod generation;
pub mod media;

// Re-export adapters
pub use audio::{RodioAudioContextFactory, RodioAudioPreparer};
pub use config::XdgConfigStore;
pub use encoder::FfmpegEncoder;
pub use generation::{
    ElevenLabsSynthesizer, GeminiClient, GeminiScriptGenerator, GeminiSpeechSynthesizer,
    GeminiStoryGenerator, GeminiVideoGenerator, PollinationsImageGenerator,
};
pub use media::{FetchingMediaLoader, MediaFetcher};
