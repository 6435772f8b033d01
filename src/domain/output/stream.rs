//! Combined output stream description

use std::sync::Arc;

use crate::domain::composition::{Dimensions, FrameRate};
use crate::domain::media::AudioTrack;

use super::EncodingFormat;

/// The synthesized video track fed from the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoTrack {
    pub dimensions: Dimensions,
    pub frame_rate: FrameRate,
}

/// The live feed being recorded: exactly one video track, at most one
/// audio track sourced from a decoded buffer.
#[derive(Debug, Clone)]
pub struct OutputStream {
    video: VideoTrack,
    audio: Option<Arc<AudioTrack>>,
    encoding: EncodingFormat,
}

impl OutputStream {
    pub fn new(
        video: VideoTrack,
        audio: Option<Arc<AudioTrack>>,
        encoding: EncodingFormat,
    ) -> Self {
        Self {
            video,
            audio,
            encoding,
        }
    }

    pub fn video(&self) -> &VideoTrack {
        &self.video
    }

    pub fn audio(&self) -> Option<&Arc<AudioTrack>> {
        self.audio.as_ref()
    }

    pub fn encoding(&self) -> EncodingFormat {
        self.encoding
    }

    pub fn track_count(&self) -> usize {
        1 + usize::from(self.audio.is_some())
    }
}
