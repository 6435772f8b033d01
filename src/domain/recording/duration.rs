//! Duration value object

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use crate::domain::error::DurationParseError;

/// Default time each still is shown when no narration drives the timing (5 seconds)
pub const DEFAULT_IMAGE_DURATION_MS: u64 = 5_000;

/// Default deadline for assembling an image sequence (30 seconds)
pub const DEFAULT_STITCH_TIMEOUT_SECS: u64 = 30;

/// Default deadline for re-cropping a video (60 seconds)
pub const DEFAULT_CROP_TIMEOUT_SECS: u64 = 60;

/// Value object representing a time duration.
/// Immutable and validated on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration {
    milliseconds: u64,
}

impl Duration {
    /// Create a Duration from milliseconds
    pub const fn from_millis(ms: u64) -> Self {
        Self { milliseconds: ms }
    }

    /// Create a Duration from seconds
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            milliseconds: secs * 1000,
        }
    }

    /// Default per-image duration (5 seconds)
    pub const fn default_image_duration() -> Self {
        Self::from_millis(DEFAULT_IMAGE_DURATION_MS)
    }

    /// Default stitch deadline (30 seconds)
    pub const fn default_stitch_timeout() -> Self {
        Self::from_secs(DEFAULT_STITCH_TIMEOUT_SECS)
    }

    /// Default crop deadline (60 seconds)
    pub const fn default_crop_timeout() -> Self {
        Self::from_secs(DEFAULT_CROP_TIMEOUT_SECS)
    }

    /// Get duration in whole seconds
    pub const fn as_secs(&self) -> u64 {
        self.milliseconds / 1000
    }

    /// Get duration in milliseconds
    pub const fn as_millis(&self) -> u64 {
        self.milliseconds
    }

    /// Convert to std::time::Duration
    pub const fn as_std(&self) -> StdDuration {
        StdDuration::from_millis(self.milliseconds)
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    /// Parse a duration string into a Duration value object.
    /// Supported formats: "500ms", "30s", "1m", "2m30s", "90s"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_lowercase();
        let err = || DurationParseError {
            input: s.to_string(),
        };

        let mut minutes: u64 = 0;
        let mut seconds: u64 = 0;
        let mut millis: u64 = 0;
        let mut current_num = String::new();
        let mut found_any = false;

        let mut chars = input.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch.is_ascii_digit() {
                current_num.push(ch);
            } else if ch == 'm' && !current_num.is_empty() {
                let value: u64 = current_num.parse().map_err(|_| err())?;
                current_num.clear();
                found_any = true;
                if chars.peek() == Some(&'s') {
                    chars.next();
                    millis = value;
                } else {
                    minutes = value;
                }
            } else if ch == 's' && !current_num.is_empty() {
                seconds = current_num.parse().map_err(|_| err())?;
                current_num.clear();
                found_any = true;
            } else {
                return Err(err());
            }
        }

        // Leftover digits without a unit are invalid
        if !current_num.is_empty() || !found_any {
            return Err(err());
        }

        let total_ms = (minutes * 60 + seconds) * 1000 + millis;

        if total_ms == 0 {
            return Err(err());
        }

        Ok(Self {
            milliseconds: total_ms,
        })
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.milliseconds % 1000 != 0 {
            return write!(f, "{}ms", self.milliseconds);
        }

        let total_secs = self.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;

        if minutes == 0 {
            write!(f, "{}s", seconds)
        } else if seconds == 0 {
            write!(f, "{}m", minutes)
        } else {
            write!(f, "{}m{}s", minutes, seconds)
        }
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::default_image_duration()
    }
}
