//! Frame rate and slide timing

use std::time::Duration as StdDuration;

use crate::domain::recording::Duration;

/// Baseline output frame rate
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// Output frame rate of the synthesized video track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRate(u32);

impl FrameRate {
    /// Create a frame rate; zero falls back to the 30 fps baseline
    pub fn new(fps: u32) -> Self {
        if fps == 0 {
            Self(DEFAULT_FRAME_RATE)
        } else {
            Self(fps)
        }
    }

    pub const fn fps(&self) -> u32 {
        self.0
    }

    /// Time between two frames (33.3ms at 30 fps)
    pub fn interval(&self) -> StdDuration {
        StdDuration::from_nanos(1_000_000_000 / self.0 as u64)
    }

    /// Index of the first frame at or after `offset` on the output timeline
    pub fn frames_at(&self, offset: StdDuration) -> u64 {
        (offset.as_secs_f64() * self.0 as f64).round() as u64
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self(DEFAULT_FRAME_RATE)
    }
}

/// Per-image display windows for an image sequence.
///
/// Without narration every image gets the caller's duration. With narration
/// of `D` seconds and `N` images every image gets `D / N` seconds, so the
/// pictures end with the audio.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideSchedule {
    windows: Vec<StdDuration>,
}

impl SlideSchedule {
    pub fn new(count: usize, per_image: Duration, audio_secs: Option<f64>) -> Self {
        let window = match audio_secs {
            Some(secs) if secs.is_finite() && secs > 0.0 && count > 0 => {
                StdDuration::from_secs_f64(secs / count as f64)
            }
            _ => per_image.as_std(),
        };
        Self {
            windows: vec![window; count],
        }
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Display window of image `index`
    pub fn window(&self, index: usize) -> Option<StdDuration> {
        self.windows.get(index).copied()
    }

    /// Offset from the session start at which image `index` begins
    pub fn start_of(&self, index: usize) -> StdDuration {
        self.windows.iter().take(index).sum()
    }

    /// Offset from the session start at which image `index` ends
    pub fn end_of(&self, index: usize) -> StdDuration {
        self.windows.iter().take(index + 1).sum()
    }

    pub fn total(&self) -> StdDuration {
        self.windows.iter().sum()
    }
}
