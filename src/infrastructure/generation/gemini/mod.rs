//! Gemini adapters: script, story manifest, speech and Veo video

mod client;
mod script;
mod speech;
mod story;
mod video;

pub use client::{GeminiClient, API_BASE_URL};
pub use script::GeminiScriptGenerator;
pub use speech::GeminiSpeechSynthesizer;
pub use story::GeminiStoryGenerator;
pub use video::GeminiVideoGenerator;
