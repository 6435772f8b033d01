//! Stream multiplexer: encoding negotiation and stream assembly

use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::composition::{Dimensions, FrameRate};
use crate::domain::media::AudioTrack;
use crate::domain::output::{EncodingFormat, OutputStream, VideoTrack};

use super::error::CompositeError;
use super::ports::{EncoderSession, MediaEncoder};

/// Combines the canvas feed and an optional audio buffer into one
/// recordable stream
pub struct StreamMultiplexer<E: MediaEncoder> {
    encoder: E,
    preferences: Vec<EncodingFormat>,
    frame_rate: FrameRate,
}

impl<E: MediaEncoder> StreamMultiplexer<E> {
    pub fn new(encoder: E, preferences: Vec<EncodingFormat>, frame_rate: FrameRate) -> Self {
        Self {
            encoder,
            preferences,
            frame_rate,
        }
    }

    pub fn frame_rate(&self) -> FrameRate {
        self.frame_rate
    }

    /// First encoding in preference order that the encoder supports
    pub async fn select_encoding(&self) -> Result<EncodingFormat, CompositeError> {
        for encoding in &self.preferences {
            if self.encoder.is_type_supported(encoding).await {
                debug!(encoding = %encoding, "Selected encoding");
                return Ok(*encoding);
            }
            debug!(encoding = %encoding, "Encoding not supported");
        }
        Err(CompositeError::EncodingUnsupported {
            tried: self.preferences.clone(),
        })
    }

    /// Build the output stream: one video track at the stream frame rate
    /// and at most one audio track from the decoded buffer
    pub async fn combine(
        &self,
        dimensions: Dimensions,
        audio: Option<Arc<AudioTrack>>,
    ) -> Result<OutputStream, CompositeError> {
        let encoding = self.select_encoding().await?;
        let video = VideoTrack {
            dimensions,
            frame_rate: self.frame_rate,
        };
        let stream = OutputStream::new(video, audio, encoding);
        info!(
            dimensions = %dimensions,
            fps = self.frame_rate.fps(),
            tracks = stream.track_count(),
            encoding = %encoding,
            "Output stream ready"
        );
        Ok(stream)
    }

    /// Start recording the stream
    pub async fn start_recording(
        &self,
        stream: &OutputStream,
    ) -> Result<Box<dyn EncoderSession>, CompositeError> {
        Ok(self.encoder.start(stream).await?)
    }
}
