//! Media encoder port interfaces

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::domain::output::{EncodingFormat, OutputStream};

/// Encoder errors
#[derive(Debug, Clone, Error)]
pub enum EncoderError {
    #[error("Encoder is not available: {0}")]
    Unavailable(String),

    #[error("Failed to start encoder: {0}")]
    StartFailed(String),

    #[error("Failed to write frame: {0}")]
    WriteFailed(String),

    #[error("Encoder failed: {0}")]
    Failed(String),

    #[error("Encoder is not recording")]
    NotRecording,
}

/// Recorder state as seen from the outside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Inactive,
    Recording,
    Stopped,
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Inactive => "inactive",
            Self::Recording => "recording",
            Self::Stopped => "stopped",
        };
        write!(f, "{}", s)
    }
}

/// Port for an encoder able to record an output stream
#[async_trait]
pub trait MediaEncoder: Send + Sync {
    /// Whether this encoder can produce the given encoding
    async fn is_type_supported(&self, encoding: &EncodingFormat) -> bool;

    /// Start recording a stream with its chosen encoding
    async fn start(&self, stream: &OutputStream) -> Result<Box<dyn EncoderSession>, EncoderError>;
}

/// One active recording
#[async_trait]
pub trait EncoderSession: Send {
    fn state(&self) -> RecorderState;

    /// Feed one RGBA frame at the stream dimensions
    async fn push_frame(&mut self, rgba: &[u8]) -> Result<(), EncoderError>;

    /// Chunks produced so far, without blocking
    fn take_available(&mut self) -> Vec<Vec<u8>>;

    /// Flush the encoder and return the remaining chunks in order
    async fn stop(&mut self) -> Result<Vec<Vec<u8>>, EncoderError>;

    /// Abort recording and discard output. Safe to call in any state.
    async fn cancel(&mut self);
}
