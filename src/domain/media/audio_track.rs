//! Decoded audio track value object

use std::fmt;

/// Decoded narration or music, ready to be played into the output stream.
/// Samples are interleaved signed 16-bit PCM.
#[derive(Clone, PartialEq)]
pub struct AudioTrack {
    samples: Vec<i16>,
    channels: u16,
    sample_rate: u32,
}

impl AudioTrack {
    /// Create a track from interleaved samples.
    /// Zero channels or sample rate are clamped to 1 so duration stays finite.
    pub fn new(samples: Vec<i16>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels: channels.max(1),
            sample_rate: sample_rate.max(1),
        }
    }

    /// Create a silent track of the given length
    pub fn silence(secs: f64, channels: u16, sample_rate: u32) -> Self {
        let channels = channels.max(1);
        let frames = (secs.max(0.0) * sample_rate as f64).round() as usize;
        Self::new(vec![0; frames * channels as usize], channels, sample_rate)
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of sample frames (one sample per channel)
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl fmt::Debug for AudioTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioTrack")
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .field("duration_secs", &self.duration_secs())
            .finish()
    }
}
