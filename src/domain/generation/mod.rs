//! Generation domain module: shapes exchanged with generative collaborators

mod manifest;

pub use manifest::{Manifest, ManifestError, Scene, MANIFEST_SCENE_COUNT};

/// Generated narration script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub text: String,
    /// True when the script is the templated stand-in, not model output
    pub is_placeholder: bool,
}

impl Script {
    pub fn generated(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_placeholder: false,
        }
    }

    /// Templated stand-in used when no provider could write the script
    pub fn placeholder(topic: &str, tone: &str) -> Self {
        Self {
            text: format!(
                "Here is a {tone} look at {topic}. We start with the big picture, \
                 walk through what makes {topic} interesting, and end with one idea \
                 worth remembering.",
                tone = tone.trim(),
                topic = topic.trim()
            ),
            is_placeholder: true,
        }
    }
}

/// Synthesized narration
#[derive(Debug, Clone, PartialEq)]
pub struct Speech {
    /// URL (usually a `data:` URI) of the encoded audio
    pub audio_url: String,
    pub duration_secs: f64,
}

/// Request for one generated still
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub seed: u64,
}

/// Handle of a long-running video generation job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoJob {
    pub id: String,
}

/// Progress of a video generation job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoJobStatus {
    Pending,
    Done { video_url: String },
    Failed(String),
}
