//! Output encodings

use std::fmt;
use std::str::FromStr;

use crate::domain::error::EncodingParseError;

/// Output container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    Webm,
    Mp4,
}

impl Container {
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Webm => "video/webm",
            Self::Mp4 => "video/mp4",
        }
    }

    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Webm => "webm",
            Self::Mp4 => "mp4",
        }
    }
}

/// Video codec of the output track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoCodec {
    Vp9,
    Vp8,
    H264,
}

impl VideoCodec {
    /// Name used in the MIME `codecs` parameter
    pub const fn mime_name(&self) -> &'static str {
        match self {
            Self::Vp9 => "vp9",
            Self::Vp8 => "vp8",
            Self::H264 => "avc1",
        }
    }
}

/// Audio codec of the output track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCodec {
    Opus,
    Aac,
}

impl AudioCodec {
    pub const fn mime_name(&self) -> &'static str {
        match self {
            Self::Opus => "opus",
            Self::Aac => "mp4a",
        }
    }
}

/// Recording encoding: container plus codecs, identified by a MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodingFormat {
    pub container: Container,
    pub video: VideoCodec,
    pub audio: AudioCodec,
    explicit_codecs: bool,
}

impl EncodingFormat {
    pub const WEBM_VP9_OPUS: Self =
        Self::with_codecs(Container::Webm, VideoCodec::Vp9, AudioCodec::Opus);
    pub const WEBM_VP8_OPUS: Self =
        Self::with_codecs(Container::Webm, VideoCodec::Vp8, AudioCodec::Opus);
    pub const MP4_H264_AAC: Self =
        Self::with_codecs(Container::Mp4, VideoCodec::H264, AudioCodec::Aac);
    /// Plain `video/webm`, letting the recorder pick its default codecs
    pub const WEBM: Self = Self {
        container: Container::Webm,
        video: VideoCodec::Vp8,
        audio: AudioCodec::Opus,
        explicit_codecs: false,
    };

    /// Default preference order: most efficient codec first,
    /// universally supported container last
    pub const DEFAULT_PREFERENCES: [Self; 4] = [
        Self::WEBM_VP9_OPUS,
        Self::WEBM_VP8_OPUS,
        Self::MP4_H264_AAC,
        Self::WEBM,
    ];

    pub const fn with_codecs(container: Container, video: VideoCodec, audio: AudioCodec) -> Self {
        Self {
            container,
            video,
            audio,
            explicit_codecs: true,
        }
    }

    /// Full MIME type, e.g. `video/webm;codecs=vp9,opus`
    pub fn mime_type(&self) -> String {
        if self.explicit_codecs {
            format!(
                "{};codecs={},{}",
                self.container.mime_type(),
                self.video.mime_name(),
                self.audio.mime_name()
            )
        } else {
            self.container.mime_type().to_string()
        }
    }

    pub fn extension(&self) -> &'static str {
        self.container.extension()
    }

    /// Parse a comma separated preference list, skipping blanks
    pub fn parse_list(list: &str) -> Result<Vec<Self>, EncodingParseError> {
        split_mime_list(list)
            .into_iter()
            .map(|item| item.parse())
            .collect()
    }
}

impl fmt::Display for EncodingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mime_type())
    }
}

impl FromStr for EncodingFormat {
    type Err = EncodingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || EncodingParseError {
            input: s.to_string(),
        };
        let normalized = s.trim().to_lowercase().replace(' ', "");
        let (base, params) = match normalized.split_once(';') {
            Some((base, params)) => (base.to_string(), Some(params.to_string())),
            None => (normalized.clone(), None),
        };

        let container = match base.as_str() {
            "video/webm" => Container::Webm,
            "video/mp4" => Container::Mp4,
            _ => return Err(err()),
        };

        let Some(params) = params else {
            return Ok(match container {
                Container::Webm => Self::WEBM,
                Container::Mp4 => Self {
                    explicit_codecs: false,
                    ..Self::MP4_H264_AAC
                },
            });
        };

        let codecs = params
            .strip_prefix("codecs=")
            .map(|c| c.trim_matches('"'))
            .ok_or_else(err)?;

        let mut video = None;
        let mut audio = None;
        for codec in codecs.split(',') {
            match codec {
                "vp9" | "vp09" => video = Some(VideoCodec::Vp9),
                "vp8" => video = Some(VideoCodec::Vp8),
                "h264" | "avc1" => video = Some(VideoCodec::H264),
                "opus" => audio = Some(AudioCodec::Opus),
                "aac" | "mp4a" => audio = Some(AudioCodec::Aac),
                _ => return Err(err()),
            }
        }

        let video = video.ok_or_else(err)?;
        let audio = audio.unwrap_or(match container {
            Container::Webm => AudioCodec::Opus,
            Container::Mp4 => AudioCodec::Aac,
        });

        let valid = matches!(
            (container, video, audio),
            (Container::Webm, VideoCodec::Vp9 | VideoCodec::Vp8, AudioCodec::Opus)
                | (Container::Mp4, VideoCodec::H264, AudioCodec::Aac | AudioCodec::Opus)
        );
        if !valid {
            return Err(err());
        }

        Ok(Self::with_codecs(container, video, audio))
    }
}

/// Split "a;codecs=x,y, b" into MIME entries: a comma only starts a new
/// entry when it is followed by a `video/` type.
fn split_mime_list(list: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for part in list.split(',') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        match items.last_mut() {
            Some(last) if !trimmed.starts_with("video/") => {
                last.push(',');
                last.push_str(trimmed);
            }
            _ => items.push(trimmed.to_string()),
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_types() {
        assert_eq!(
            EncodingFormat::WEBM_VP9_OPUS.mime_type(),
            "video/webm;codecs=vp9,opus"
        );
        assert_eq!(
            EncodingFormat::MP4_H264_AAC.mime_type(),
            "video/mp4;codecs=avc1,mp4a"
        );
        assert_eq!(EncodingFormat::WEBM.mime_type(), "video/webm");
    }

    #[test]
    fn default_preferences_start_with_vp9() {
        let prefs = EncodingFormat::DEFAULT_PREFERENCES;
        assert_eq!(prefs[0], EncodingFormat::WEBM_VP9_OPUS);
        assert_eq!(prefs[prefs.len() - 1], EncodingFormat::WEBM);
    }

    #[test]
    fn parse_known_mime_types() {
        for format in EncodingFormat::DEFAULT_PREFERENCES {
            let parsed: EncodingFormat = format.mime_type().parse().unwrap();
            assert_eq!(parsed, format);
        }
    }

    #[test]
    fn parse_video_only_codecs() {
        let parsed: EncodingFormat = "video/webm;codecs=vp9".parse().unwrap();
        assert_eq!(parsed, EncodingFormat::WEBM_VP9_OPUS);
    }

    #[test]
    fn parse_tolerates_case_and_spaces() {
        let parsed: EncodingFormat = "Video/WebM; codecs=\"VP8, Opus\"".parse().unwrap();
        assert_eq!(parsed, EncodingFormat::WEBM_VP8_OPUS);
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!("video/avi".parse::<EncodingFormat>().is_err());
        assert!("video/webm;codecs=theora".parse::<EncodingFormat>().is_err());
        assert!("video/webm;codecs=avc1".parse::<EncodingFormat>().is_err());
        assert!("video/webm;bitrate=5".parse::<EncodingFormat>().is_err());
    }

    #[test]
    fn parse_list_groups_codec_parameters() {
        let list = EncodingFormat::parse_list(
            "video/webm;codecs=vp9,opus, video/mp4;codecs=avc1,mp4a, video/webm",
        )
        .unwrap();
        assert_eq!(
            list,
            vec![
                EncodingFormat::WEBM_VP9_OPUS,
                EncodingFormat::MP4_H264_AAC,
                EncodingFormat::WEBM
            ]
        );
    }

    #[test]
    fn extension_follows_container() {
        assert_eq!(EncodingFormat::MP4_H264_AAC.extension(), "mp4");
        assert_eq!(EncodingFormat::WEBM_VP8_OPUS.extension(), "webm");
    }
}
