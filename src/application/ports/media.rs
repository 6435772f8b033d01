//! Media loading port interfaces

use async_trait::async_trait;
use image::RgbaImage;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::media::MediaSource;

/// Media loading errors
#[derive(Debug, Clone, Error)]
pub enum MediaLoadError {
    #[error("Invalid media URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch media: {0}")]
    Fetch(String),

    #[error("Media request returned HTTP {status}")]
    Status { status: u16 },

    #[error("Failed to decode media: {0}")]
    Decode(String),

    #[error("Cross-origin access denied for {0}")]
    CrossOrigin(String),

    #[error("Failed to probe video: {0}")]
    Probe(String),
}

/// Playback errors raised by a video source or audio context
#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    #[error("Playback was rejected: {0}")]
    Rejected(String),

    #[error("Playback failed: {0}")]
    Failed(String),

    #[error("Playback target is closed")]
    Closed,
}

/// A decoded still image with its natural dimensions
#[derive(Debug, Clone)]
pub struct LoadedImage {
    source: MediaSource,
    pixels: Arc<RgbaImage>,
}

impl LoadedImage {
    pub fn new(source: MediaSource, pixels: RgbaImage) -> Self {
        Self {
            source,
            pixels: Arc::new(pixels),
        }
    }

    pub fn source(&self) -> &MediaSource {
        &self.source
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// An opened, probed video. Dimensions and frame rate are known as soon
/// as the handle exists.
#[async_trait]
pub trait VideoSource: Send {
    /// Source description with natural dimensions
    fn source(&self) -> &MediaSource;

    /// Native frame rate of the source
    fn frame_rate(&self) -> f64;

    /// Start decoding. May be rejected.
    async fn play(&mut self) -> Result<(), PlaybackError>;

    /// Next decoded RGBA frame, or `None` once the source has ended
    async fn next_frame(&mut self) -> Result<Option<RgbaImage>, PlaybackError>;

    /// Release the decoder. Safe to call more than once.
    async fn close(&mut self);
}

/// Port for resolving media URLs into decoded handles
#[async_trait]
pub trait MediaLoader: Send + Sync {
    /// Fetch and decode a still image.
    ///
    /// # Arguments
    /// * `url` - http(s), data URI, file URL or local path
    async fn load_image(&self, url: &str) -> Result<LoadedImage, MediaLoadError>;

    /// Open and probe a video without starting playback.
    async fn open_video(&self, url: &str) -> Result<Box<dyn VideoSource>, MediaLoadError>;
}
