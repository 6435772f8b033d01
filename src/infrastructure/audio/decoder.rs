//! Audio preparer backed by rodio's decoders

use std::io::Cursor;

use async_trait::async_trait;
use rodio::{Decoder, Source};
use tracing::debug;

use crate::application::ports::{AudioPrepError, AudioPreparer};
use crate::domain::media::AudioTrack;
use crate::infrastructure::media::MediaFetcher;

/// Fetches audio and decodes it (MP3, FLAC, WAV, Vorbis) to PCM
pub struct RodioAudioPreparer {
    fetcher: MediaFetcher,
}

impl RodioAudioPreparer {
    pub fn new(fetcher: MediaFetcher) -> Self {
        Self { fetcher }
    }
}

/// Decode an encoded payload into an interleaved i16 track
pub fn decode_audio(bytes: Vec<u8>) -> Result<AudioTrack, AudioPrepError> {
    if bytes.is_empty() {
        return Err(AudioPrepError::EmptyPayload);
    }
    let decoder =
        Decoder::new(Cursor::new(bytes)).map_err(|e| AudioPrepError::Decode(e.to_string()))?;
    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let samples: Vec<i16> = decoder.collect();
    Ok(AudioTrack::new(samples, channels, sample_rate))
}

#[async_trait]
impl AudioPreparer for RodioAudioPreparer {
    async fn prepare(&self, url: &str) -> Result<AudioTrack, AudioPrepError> {
        let fetched = self.fetcher.fetch(url).await?;
        let size = fetched.bytes.len();

        let track = tokio::task::spawn_blocking(move || decode_audio(fetched.bytes))
            .await
            .map_err(|_| AudioPrepError::DecoderUnavailable)??;

        debug!(
            bytes = size,
            secs = track.duration_secs(),
            channels = track.channels(),
            rate = track.sample_rate(),
            "Decoded audio"
        );
        Ok(track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::media::DataUri;
    use crate::infrastructure::audio::encode_to_flac;

    #[test]
    fn empty_payload_is_rejected() {
        assert!(matches!(decode_audio(Vec::new()), Err(AudioPrepError::EmptyPayload)));
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(matches!(
            decode_audio(b"definitely not audio".to_vec()),
            Err(AudioPrepError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn decodes_flac_data_uri() {
        let pcm = vec![0i16; 16_000];
        let flac = encode_to_flac(&pcm, 1, 16_000).unwrap();
        let url = DataUri::encode("audio/flac", &flac);

        let track = RodioAudioPreparer::new(MediaFetcher::new(None))
            .prepare(&url)
            .await
            .unwrap();

        assert_eq!(track.sample_rate(), 16_000);
        assert_eq!(track.channels(), 1);
        assert!((track.duration_secs() - 1.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn fetch_failure_maps_to_fetch_error() {
        let err = RodioAudioPreparer::new(MediaFetcher::new(None))
            .prepare("/missing/voice.mp3")
            .await
            .unwrap_err();
        assert!(matches!(err, AudioPrepError::Fetch(_)));
    }
}
