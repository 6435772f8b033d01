//! Command runners for the compositor and generator subcommands

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::application::generation::{DEFAULT_POLL_INTERVAL_SECS, DEFAULT_VIDEO_MAX_WAIT_SECS};
use crate::application::ports::{
    ConfigStore, GenerationError, ImageGenerator, ScriptGenerator, SpeechSynthesizer,
};
use crate::application::{
    CompositeError, CompositorOptions, CropRequest, CropVideoUseCase, ProviderChain, ScriptService,
    SpeechService, StitchFramesUseCase, StitchRequest, StoryService, StreamMultiplexer,
    VideoGenerationService,
};
use crate::domain::composition::Dimensions;
use crate::domain::config::AppConfig;
use crate::domain::generation::ImageRequest;
use crate::domain::media::DataUri;
use crate::domain::output::{CompositeAsset, EncodingFormat, ObjectUrlRegistry};
use crate::domain::recording::Duration;
use crate::infrastructure::{
    ElevenLabsSynthesizer, FetchingMediaLoader, FfmpegEncoder, GeminiClient,
    GeminiScriptGenerator, GeminiSpeechSynthesizer, GeminiStoryGenerator, GeminiVideoGenerator,
    MediaFetcher, PollinationsImageGenerator, RodioAudioContextFactory, RodioAudioPreparer,
    XdgConfigStore,
};

use super::args::{CropArgs, GenerateAction, StitchArgs};
use super::presenter::Presenter;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Error raised while running a command, carrying its exit code
#[derive(Debug)]
pub enum RunError {
    Usage(String),
    Runtime(String),
}

impl RunError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Usage(_) => ExitCode::from(EXIT_USAGE_ERROR),
            Self::Runtime(_) => ExitCode::from(EXIT_ERROR),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Usage(m) | Self::Runtime(m) => m,
        }
    }
}

impl From<CompositeError> for RunError {
    fn from(e: CompositeError) -> Self {
        match e {
            CompositeError::InvalidInput(_) => Self::Usage(e.to_string()),
            other => Self::Runtime(other.to_string()),
        }
    }
}

impl From<GenerationError> for RunError {
    fn from(e: GenerationError) -> Self {
        Self::Runtime(e.to_string())
    }
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|_| AppConfig::empty());

    let env_config = AppConfig {
        gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|s| !s.is_empty()),
        elevenlabs_api_key: env::var("ELEVENLABS_API_KEY").ok().filter(|s| !s.is_empty()),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}

/// Parse an optional duration setting, reporting bad values as usage errors
fn duration_setting(
    value: Option<&str>,
    key: &str,
    default: Duration,
) -> Result<Duration, RunError> {
    match value {
        Some(s) => s
            .parse()
            .map_err(|e| RunError::Usage(format!("Invalid {}: {}", key, e))),
        None => Ok(default),
    }
}

fn encodings_setting(config: &AppConfig) -> Result<Vec<EncodingFormat>, RunError> {
    match config.encodings.as_deref() {
        Some(list) => {
            let parsed = EncodingFormat::parse_list(list)
                .map_err(|e| RunError::Usage(format!("Invalid encodings: {}", e)))?;
            if parsed.is_empty() {
                Ok(config.encodings_or_default())
            } else {
                Ok(parsed)
            }
        }
        None => Ok(config.encodings_or_default()),
    }
}

fn dimensions(width: u32, height: u32) -> Result<Dimensions, RunError> {
    Dimensions::new(width, height).map_err(|e| RunError::Usage(e.to_string()))
}

fn multiplexer(config: &AppConfig) -> Result<StreamMultiplexer<FfmpegEncoder>, RunError> {
    Ok(StreamMultiplexer::new(
        FfmpegEncoder::new(config.ffmpeg_path_or_default()),
        encodings_setting(config)?,
        config.frame_rate_or_default(),
    ))
}

fn loader(config: &AppConfig) -> FetchingMediaLoader {
    FetchingMediaLoader::new(MediaFetcher::new(config.origin.clone()))
        .with_ffmpeg(config.ffmpeg_path_or_default(), config.ffprobe_path_or_default())
}

/// Where to write an asset when no explicit output is given
fn default_output(config: &AppConfig, asset: &CompositeAsset) -> PathBuf {
    let dir = config
        .output_dir
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let id = asset
        .url()
        .as_str()
        .rsplit('/')
        .next()
        .and_then(|id| id.get(..8))
        .unwrap_or("output");
    dir.join(format!("reel-{}.{}", id, asset.encoding().extension()))
}

fn save_asset(
    asset: &CompositeAsset,
    output: Option<&Path>,
    config: &AppConfig,
) -> Result<PathBuf, RunError> {
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(config, asset));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            RunError::Runtime(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }
    asset
        .save_to(&path)
        .map_err(|e| RunError::Runtime(format!("Failed to write {}: {}", path.display(), e)))?;
    Ok(path)
}

/// Run the stitch command
pub async fn run_stitch(args: StitchArgs, config: AppConfig) -> Result<(), RunError> {
    let mut presenter = Presenter::new();

    let target = match (args.width, args.height) {
        (Some(w), Some(h)) => Some(dimensions(w, h)?),
        _ => None,
    };
    let request = StitchRequest {
        images: args.images,
        audio_url: args.audio,
        per_image_duration: duration_setting(
            config.image_duration.as_deref(),
            "image duration",
            Duration::default_image_duration(),
        )?,
        target,
    };
    let options = CompositorOptions {
        deadline: duration_setting(
            config.stitch_timeout.as_deref(),
            "timeout",
            Duration::default_stitch_timeout(),
        )?,
        monitor_audio: config.monitor_audio_or_default(),
    };

    let use_case = StitchFramesUseCase::new(
        loader(&config),
        RodioAudioPreparer::new(MediaFetcher::new(config.origin.clone())),
        multiplexer(&config)?,
        RodioAudioContextFactory,
        ObjectUrlRegistry::new(),
        options,
    );

    presenter.start_spinner(&format!("Stitching {} image(s)...", request.images.len()));
    let asset = match use_case.execute(request).await {
        Ok(asset) => asset,
        Err(e) => {
            presenter.spinner_fail("Stitch failed");
            return Err(e.into());
        }
    };
    presenter.spinner_success(&Presenter::asset_summary(&asset));

    let path = save_asset(&asset, args.render.output.as_deref(), &config)?;
    presenter.output(&path.to_string_lossy());
    Ok(())
}

/// Run the crop command
pub async fn run_crop(args: CropArgs, config: AppConfig) -> Result<(), RunError> {
    let mut presenter = Presenter::new();

    let request = CropRequest {
        source_url: args.source,
        target: dimensions(args.width, args.height)?,
    };
    let options = CompositorOptions {
        deadline: duration_setting(
            config.crop_timeout.as_deref(),
            "timeout",
            Duration::default_crop_timeout(),
        )?,
        monitor_audio: false,
    };

    let use_case = CropVideoUseCase::new(
        loader(&config),
        multiplexer(&config)?,
        ObjectUrlRegistry::new(),
        options,
    );

    presenter.start_spinner(&format!("Cropping to {}...", request.target));
    let asset = match use_case.execute(request).await {
        Ok(asset) => asset,
        Err(e) => {
            presenter.spinner_fail("Crop failed");
            return Err(e.into());
        }
    };
    presenter.spinner_success(&Presenter::asset_summary(&asset));

    let path = save_asset(&asset, args.render.output.as_deref(), &config)?;
    presenter.output(&path.to_string_lossy());
    Ok(())
}

fn gemini_client(config: &AppConfig) -> Option<GeminiClient> {
    config.gemini_api_key.as_deref().map(GeminiClient::new)
}

fn require_gemini(config: &AppConfig) -> Result<GeminiClient, RunError> {
    gemini_client(config).ok_or_else(|| {
        RunError::Runtime(
            "Missing API key. Set GEMINI_API_KEY or run 'reelforge config set gemini_api_key <key>'"
                .to_string(),
        )
    })
}

/// Speech providers in fallback order: ElevenLabs, then Gemini TTS
fn speech_chain(config: &AppConfig) -> ProviderChain<dyn SpeechSynthesizer> {
    let mut chain = ProviderChain::<dyn SpeechSynthesizer>::new();
    if let Some(key) = config.elevenlabs_api_key.as_deref() {
        chain = chain.with(
            "elevenlabs",
            Arc::new(
                ElevenLabsSynthesizer::new(key).with_voice(config.elevenlabs_voice_or_default()),
            ),
        );
    }
    if let Some(client) = gemini_client(config) {
        chain = chain.with("gemini", Arc::new(GeminiSpeechSynthesizer::new(client)));
    }
    chain
}

/// Run a generate subcommand
pub async fn run_generate(action: GenerateAction, config: AppConfig) -> Result<(), RunError> {
    let mut presenter = Presenter::new();

    match action {
        GenerateAction::Script { topic, tone } => {
            let mut chain = ProviderChain::<dyn ScriptGenerator>::new();
            if let Some(client) = gemini_client(&config) {
                chain = chain.with("gemini", Arc::new(GeminiScriptGenerator::new(client)));
            }
            presenter.start_spinner("Writing script...");
            let script = ScriptService::new(chain).generate(&topic, &tone).await;
            if script.is_placeholder {
                presenter.stop_spinner();
                presenter.warn("No provider could write the script; using a placeholder");
            } else {
                presenter.spinner_success("Script ready");
            }
            presenter.output(&script.text);
        }
        GenerateAction::Story { idea, style } => {
            let service = StoryService::new(GeminiStoryGenerator::new(require_gemini(&config)?));
            presenter.start_spinner("Writing story...");
            let manifest = match service.generate(&idea, &style).await {
                Ok(m) => m,
                Err(e) => {
                    presenter.spinner_fail("Story failed");
                    return Err(e.into());
                }
            };
            presenter.spinner_success(&manifest.title);
            let json = serde_json::to_string_pretty(&manifest)
                .map_err(|e| RunError::Runtime(e.to_string()))?;
            presenter.output(&json);
        }
        GenerateAction::Image {
            prompt,
            width,
            height,
            seed,
        } => {
            let request = ImageRequest {
                prompt,
                width,
                height,
                seed,
            };
            let url = PollinationsImageGenerator::new()
                .generate_image(&request)
                .await
                .map_err(|e| RunError::Usage(e.to_string()))?;
            presenter.output(&url);
        }
        GenerateAction::Speech {
            text,
            voice,
            output,
        } => {
            let chain = speech_chain(&config);
            if chain.is_empty() {
                return Err(RunError::Runtime(
                    "No speech provider configured. Set ELEVENLABS_API_KEY or GEMINI_API_KEY"
                        .to_string(),
                ));
            }
            presenter.start_spinner("Synthesizing speech...");
            let speech = match SpeechService::new(chain).synthesize(&text, voice.as_deref()).await {
                Ok(s) => s,
                Err(e) => {
                    presenter.spinner_fail("Speech failed");
                    return Err(e.into());
                }
            };
            presenter.spinner_success(&format!("Speech ready ({:.1}s)", speech.duration_secs));

            match output {
                Some(path) => {
                    let data = DataUri::parse(&speech.audio_url)
                        .map_err(|e| RunError::Runtime(e.to_string()))?;
                    std::fs::write(&path, data.data).map_err(|e| {
                        RunError::Runtime(format!("Failed to write {}: {}", path.display(), e))
                    })?;
                    presenter.output(&path.to_string_lossy());
                }
                None => presenter.output(&speech.audio_url),
            }
        }
        GenerateAction::Video {
            prompt,
            image,
            max_wait,
        } => {
            let max_wait = duration_setting(
                max_wait.as_deref(),
                "max wait",
                Duration::from_secs(DEFAULT_VIDEO_MAX_WAIT_SECS),
            )?;
            let generator = GeminiVideoGenerator::new(
                require_gemini(&config)?,
                MediaFetcher::new(config.origin.clone()),
            );
            let service = VideoGenerationService::new(generator)
                .with_polling(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS), max_wait);

            presenter.start_spinner("Generating video (this can take minutes)...");
            let url = match service.generate(&prompt, image.as_deref()).await {
                Ok(url) => url,
                Err(e) => {
                    presenter.spinner_fail("Video generation failed");
                    return Err(e.into());
                }
            };
            presenter.spinner_success("Video ready");
            presenter.output(&url);
        }
    }
    Ok(())
}
