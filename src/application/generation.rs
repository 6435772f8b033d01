//! Generation services around the collaborator ports

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::generation::{Manifest, Script, Speech, VideoJobStatus};
use crate::domain::recording::Duration;

use super::fallback::ProviderChain;
use super::ports::{
    GenerationError, ScriptGenerator, SpeechSynthesizer, StoryGenerator, VideoGenerator,
};

/// Writes narration scripts. Never fails: when every provider is out,
/// a templated placeholder is returned instead.
pub struct ScriptService {
    providers: ProviderChain<dyn ScriptGenerator>,
}

impl ScriptService {
    pub fn new(providers: ProviderChain<dyn ScriptGenerator>) -> Self {
        Self { providers }
    }

    pub async fn generate(&self, topic: &str, tone: &str) -> Script {
        self.providers
            .or_terminal(
                |p| p.generate_script(topic, tone),
                |e| {
                    if matches!(e, GenerationError::QuotaExceeded) {
                        info!("Script quota exhausted, using placeholder script");
                    }
                    Script::placeholder(topic, tone)
                },
            )
            .await
    }
}

/// Produces story manifests and enforces their schema
pub struct StoryService<S: StoryGenerator> {
    generator: S,
}

impl<S: StoryGenerator> StoryService<S> {
    pub fn new(generator: S) -> Self {
        Self { generator }
    }

    pub async fn generate(
        &self,
        idea: &str,
        style_hints: &[String],
    ) -> Result<Manifest, GenerationError> {
        let manifest = self.generator.generate_manifest(idea, style_hints).await?;
        manifest.validate()?;
        debug!(title = %manifest.title, scenes = manifest.scenes.len(), "Manifest generated");
        Ok(manifest)
    }
}

/// Synthesizes narration, trying each speech provider in turn
pub struct SpeechService {
    providers: ProviderChain<dyn SpeechSynthesizer>,
}

impl SpeechService {
    pub fn new(providers: ProviderChain<dyn SpeechSynthesizer>) -> Self {
        Self { providers }
    }

    pub async fn synthesize(
        &self,
        text: &str,
        voice: Option<&str>,
    ) -> Result<Speech, GenerationError> {
        if text.trim().is_empty() {
            return Err(GenerationError::Failed("nothing to synthesize".to_string()));
        }
        self.providers
            .first_success(|p| p.synthesize(text, voice))
            .await
    }
}

/// Default delay between two status checks of a video job
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Default limit on how long a video job may run
pub const DEFAULT_VIDEO_MAX_WAIT_SECS: u64 = 300;

/// Submits a video job and polls it to a terminal state
pub struct VideoGenerationService<V: VideoGenerator> {
    generator: V,
    poll_interval: Duration,
    max_wait: Duration,
}

impl<V: VideoGenerator> VideoGenerationService<V> {
    pub fn new(generator: V) -> Self {
        Self {
            generator,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_wait: Duration::from_secs(DEFAULT_VIDEO_MAX_WAIT_SECS),
        }
    }

    pub fn with_polling(mut self, poll_interval: Duration, max_wait: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.max_wait = max_wait;
        self
    }

    /// Generate a clip and return its URL
    pub async fn generate(
        &self,
        prompt: &str,
        image_url: Option<&str>,
    ) -> Result<String, GenerationError> {
        let job = self.generator.submit(prompt, image_url).await?;
        info!(job = %job.id, "Video job submitted");

        let started = Instant::now();
        loop {
            match self.generator.poll(&job).await? {
                VideoJobStatus::Done { video_url } => {
                    info!(job = %job.id, secs = started.elapsed().as_secs(), "Video job finished");
                    return Ok(video_url);
                }
                VideoJobStatus::Failed(reason) => {
                    warn!(job = %job.id, reason = %reason, "Video job failed");
                    return Err(GenerationError::Failed(reason));
                }
                VideoJobStatus::Pending => {
                    if started.elapsed() + self.poll_interval.as_std() > self.max_wait.as_std() {
                        return Err(GenerationError::Timeout(self.max_wait));
                    }
                    debug!(job = %job.id, "Video job pending");
                    tokio::time::sleep(self.poll_interval.as_std()).await;
                }
            }
        }
    }
}
