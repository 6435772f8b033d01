//! Errors surfaced by the compositor use cases

use thiserror::Error;

use crate::domain::output::EncodingFormat;
use crate::domain::recording::{Duration, InvalidStateTransition};

use super::ports::{EncoderError, MediaLoadError, PlaybackError};

/// Compositor errors
#[derive(Debug, Clone, Error)]
pub enum CompositeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to load media #{index} ({url}): {source}")]
    MediaLoad {
        index: usize,
        url: String,
        #[source]
        source: MediaLoadError,
    },

    #[error("Cross-origin access denied for {url}")]
    CrossOrigin { url: String },

    #[error("No supported encoding (tried: {})", format_tried(.tried))]
    EncodingUnsupported { tried: Vec<EncodingFormat> },

    #[error("Compositing did not finish within {0}")]
    Timeout(Duration),

    #[error("Playback failed: {0}")]
    Playback(#[from] PlaybackError),

    #[error("Encoder failed: {0}")]
    Encoder(#[from] EncoderError),

    #[error("Recording session error: {0}")]
    InvalidState(#[from] InvalidStateTransition),
}

impl CompositeError {
    /// Map a load failure of the source at `index`. Origin policy
    /// failures keep their own variant.
    pub fn from_load(index: usize, url: &str, error: MediaLoadError) -> Self {
        match error {
            MediaLoadError::CrossOrigin(_) => Self::CrossOrigin {
                url: url.to_string(),
            },
            source => Self::MediaLoad {
                index,
                url: url.to_string(),
                source,
            },
        }
    }
}

fn format_tried(tried: &[EncodingFormat]) -> String {
    tried
        .iter()
        .map(|e| e.mime_type())
        .collect::<Vec<_>>()
        .join(", ")
}
