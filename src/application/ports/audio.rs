//! Audio port interfaces: decoding and routing

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::media::AudioTrack;

use super::PlaybackError;

/// Audio preparation errors. The compositor recovers from all of them by
/// continuing without audio.
#[derive(Debug, Clone, Error)]
pub enum AudioPrepError {
    #[error("Failed to fetch audio: {0}")]
    Fetch(String),

    #[error("Audio request returned HTTP {status}")]
    Status { status: u16 },

    #[error("Audio payload is empty")]
    EmptyPayload,

    #[error("Failed to decode audio: {0}")]
    Decode(String),

    #[error("No audio decoder available")]
    DecoderUnavailable,
}

/// Port for fetching and decoding an audio URL into a sample buffer
#[async_trait]
pub trait AudioPreparer: Send + Sync {
    async fn prepare(&self, url: &str) -> Result<AudioTrack, AudioPrepError>;
}

/// Audio context lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioContextState {
    Suspended,
    Running,
    Closed,
}

impl AudioContextState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Suspended => "suspended",
            Self::Running => "running",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for AudioContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a playing buffer is routed besides the recorded stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioRouting {
    /// Also play through the local output device
    pub monitor: bool,
}

/// Routing context for one compositor invocation
#[async_trait]
pub trait AudioContext: Send + Sync {
    fn state(&self) -> AudioContextState;

    /// Move a suspended context to running. May be gated by the platform.
    async fn resume(&self) -> Result<(), PlaybackError>;

    /// Start playing a buffer from its beginning
    async fn play(
        &self,
        track: Arc<AudioTrack>,
        routing: AudioRouting,
    ) -> Result<(), PlaybackError>;

    /// Stop playback and release the context. Idempotent.
    async fn close(&self);
}

/// Creates a fresh audio context per invocation
pub trait AudioContextFactory: Send + Sync {
    fn create(&self) -> Arc<dyn AudioContext>;
}
