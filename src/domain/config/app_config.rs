//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::composition::{FrameRate, DEFAULT_FRAME_RATE};
use crate::domain::output::EncodingFormat;
use crate::domain::recording::Duration;

pub const DEFAULT_ELEVENLABS_VOICE: &str = "21m00Tcm4TlvDq8ikWAM";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub gemini_api_key: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_voice: Option<String>,
    pub image_duration: Option<String>,
    pub stitch_timeout: Option<String>,
    pub crop_timeout: Option<String>,
    pub frame_rate: Option<u32>,
    /// Comma separated MIME preference list
    pub encodings: Option<String>,
    pub ffmpeg_path: Option<String>,
    pub ffprobe_path: Option<String>,
    /// Origin sent with remote media requests; enables CORS checks
    pub origin: Option<String>,
    pub monitor_audio: Option<bool>,
    pub output_dir: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            gemini_api_key: None,
            elevenlabs_api_key: None,
            elevenlabs_voice: Some(DEFAULT_ELEVENLABS_VOICE.to_string()),
            image_duration: Some("5s".to_string()),
            stitch_timeout: Some("30s".to_string()),
            crop_timeout: Some("60s".to_string()),
            frame_rate: Some(DEFAULT_FRAME_RATE),
            encodings: None,
            ffmpeg_path: Some("ffmpeg".to_string()),
            ffprobe_path: Some("ffprobe".to_string()),
            origin: None,
            monitor_audio: Some(false),
            output_dir: None,
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            gemini_api_key: other.gemini_api_key.or(self.gemini_api_key),
            elevenlabs_api_key: other.elevenlabs_api_key.or(self.elevenlabs_api_key),
            elevenlabs_voice: other.elevenlabs_voice.or(self.elevenlabs_voice),
            image_duration: other.image_duration.or(self.image_duration),
            stitch_timeout: other.stitch_timeout.or(self.stitch_timeout),
            crop_timeout: other.crop_timeout.or(self.crop_timeout),
            frame_rate: other.frame_rate.or(self.frame_rate),
            encodings: other.encodings.or(self.encodings),
            ffmpeg_path: other.ffmpeg_path.or(self.ffmpeg_path),
            ffprobe_path: other.ffprobe_path.or(self.ffprobe_path),
            origin: other.origin.or(self.origin),
            monitor_audio: other.monitor_audio.or(self.monitor_audio),
            output_dir: other.output_dir.or(self.output_dir),
        }
    }

    /// Get image_duration as parsed Duration, or default if not set/invalid
    pub fn image_duration_or_default(&self) -> Duration {
        self.image_duration
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_image_duration)
    }

    pub fn stitch_timeout_or_default(&self) -> Duration {
        self.stitch_timeout
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_stitch_timeout)
    }

    pub fn crop_timeout_or_default(&self) -> Duration {
        self.crop_timeout
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_crop_timeout)
    }

    pub fn frame_rate_or_default(&self) -> FrameRate {
        FrameRate::new(self.frame_rate.unwrap_or(DEFAULT_FRAME_RATE))
    }

    /// Encoding preference list; falls back to the built-in order when
    /// unset, empty or unparseable
    pub fn encodings_or_default(&self) -> Vec<EncodingFormat> {
        self.encodings
            .as_deref()
            .and_then(|list| EncodingFormat::parse_list(list).ok())
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| EncodingFormat::DEFAULT_PREFERENCES.to_vec())
    }

    pub fn ffmpeg_path_or_default(&self) -> &str {
        self.ffmpeg_path.as_deref().unwrap_or("ffmpeg")
    }

    pub fn ffprobe_path_or_default(&self) -> &str {
        self.ffprobe_path.as_deref().unwrap_or("ffprobe")
    }

    pub fn elevenlabs_voice_or_default(&self) -> &str {
        self.elevenlabs_voice
            .as_deref()
            .unwrap_or(DEFAULT_ELEVENLABS_VOICE)
    }

    /// Get monitor_audio setting, or false if not set
    pub fn monitor_audio_or_default(&self) -> bool {
        self.monitor_audio.unwrap_or(false)
    }
}
