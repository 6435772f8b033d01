//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Reelforge - assemble generated stills and narration into short videos
#[derive(Parser, Debug)]
#[command(name = "reelforge")]
#[command(version)]
#[command(about = "Stitch images and narration into a video, re-crop clips, and run AI generators")]
#[command(long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Composite images and an optional narration track into one video
    Stitch(StitchArgs),
    /// Re-frame a video to a new size with a cover-fit crop
    Crop(CropArgs),
    /// Run a generative collaborator
    Generate {
        #[command(subcommand)]
        action: GenerateAction,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options shared by the compositor commands
#[derive(Args, Debug, Clone, Default)]
pub struct RenderArgs {
    /// Output file (default: <output_dir>/reel-<id>.<ext>)
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Deadline for the whole composite (e.g. 30s, 1m)
    #[arg(long, value_name = "TIME")]
    pub timeout: Option<String>,

    /// Output frame rate
    #[arg(long, value_name = "FPS")]
    pub fps: Option<u32>,

    /// Comma separated encoding preferences, e.g. "video/webm;codecs=vp9,opus"
    #[arg(long, value_name = "MIME")]
    pub encodings: Option<String>,

    /// Origin sent with remote media requests; enables cross-origin checks
    #[arg(long, value_name = "ORIGIN")]
    pub origin: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct StitchArgs {
    /// Image URLs, data URIs or paths, in display order
    #[arg(required = true, value_name = "IMAGES")]
    pub images: Vec<String>,

    /// Narration URL, data URI or path
    #[arg(short = 'a', long, value_name = "AUDIO")]
    pub audio: Option<String>,

    /// Display time per image when there is no narration
    #[arg(short = 'd', long, value_name = "TIME")]
    pub duration: Option<String>,

    /// Output width (default: first image's width)
    #[arg(long, requires = "height")]
    pub width: Option<u32>,

    /// Output height (default: first image's height)
    #[arg(long, requires = "width")]
    pub height: Option<u32>,

    /// Also play the narration on the local output device
    #[arg(long)]
    pub monitor: bool,

    #[command(flatten)]
    pub render: RenderArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CropArgs {
    /// Video URL or path
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Output width
    #[arg(long)]
    pub width: u32,

    /// Output height
    #[arg(long)]
    pub height: u32,

    #[command(flatten)]
    pub render: RenderArgs,
}

/// Generator subcommands
#[derive(Subcommand, Debug)]
pub enum GenerateAction {
    /// Write a narration script
    Script {
        /// What the video is about
        topic: String,
        /// Tone of voice
        #[arg(long, default_value = "engaging")]
        tone: String,
    },
    /// Write a five-scene story manifest (JSON on stdout)
    Story {
        /// Story idea
        idea: String,
        /// Style keywords, repeatable
        #[arg(long = "style", value_name = "HINT")]
        style: Vec<String>,
    },
    /// Build an image URL for a prompt
    Image {
        prompt: String,
        #[arg(long, default_value_t = 720)]
        width: u32,
        #[arg(long, default_value_t = 1280)]
        height: u32,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Synthesize narration
    Speech {
        text: String,
        /// Voice name or id
        #[arg(long)]
        voice: Option<String>,
        /// Write the audio to a file instead of printing its data URI
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Generate a video clip
    Video {
        prompt: String,
        /// First frame image
        #[arg(long, value_name = "URL")]
        image: Option<String>,
        /// Give up after this long (e.g. 5m)
        #[arg(long, value_name = "TIME")]
        max_wait: Option<String>,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "gemini_api_key",
    "elevenlabs_api_key",
    "elevenlabs_voice",
    "image_duration",
    "stitch_timeout",
    "crop_timeout",
    "frame_rate",
    "encodings",
    "ffmpeg_path",
    "ffprobe_path",
    "origin",
    "monitor_audio",
    "output_dir",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
