//! Generative collaborator port interfaces
//!
//! Each collaborator is an opaque asynchronous operation returning a
//! media URL or a structured payload.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::generation::{
    ImageRequest, Manifest, ManifestError, Script, Speech, VideoJob, VideoJobStatus,
};
use crate::domain::recording::Duration;

/// Generation errors
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("Upstream quota exceeded. Please try again later.")]
    QuotaExceeded,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Missing API key for {0}")]
    MissingApiKey(&'static str),

    #[error("Response was truncated before completion")]
    Truncated,

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("Response does not match the manifest schema: {0}")]
    Schema(#[from] ManifestError),

    #[error("Empty response")]
    EmptyResponse,

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Generation failed: {0}")]
    Failed(String),

    #[error("Generation did not finish within {0}")]
    Timeout(Duration),

    #[error("No provider configured")]
    NoProvider,
}

/// Port for narration script writing
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    async fn generate_script(&self, topic: &str, tone: &str) -> Result<Script, GenerationError>;
}

/// Port for structured story manifests
#[async_trait]
pub trait StoryGenerator: Send + Sync {
    /// Generate a title and shot list.
    ///
    /// # Arguments
    /// * `idea` - Free-form story idea
    /// * `style_hints` - Visual or narrative style keywords
    async fn generate_manifest(
        &self,
        idea: &str,
        style_hints: &[String],
    ) -> Result<Manifest, GenerationError>;
}

/// Port for still image generation. Returns the image URL.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, request: &ImageRequest) -> Result<String, GenerationError>;
}

/// Port for text-to-speech
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<Speech, GenerationError>;
}

/// Port for long-running text/image-to-video generation
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Submit a job
    ///
    /// # Arguments
    /// * `prompt` - Description of the clip
    /// * `image_url` - Optional first frame
    async fn submit(
        &self,
        prompt: &str,
        image_url: Option<&str>,
    ) -> Result<VideoJob, GenerationError>;

    /// Check a submitted job once
    async fn poll(&self, job: &VideoJob) -> Result<VideoJobStatus, GenerationError>;
}
