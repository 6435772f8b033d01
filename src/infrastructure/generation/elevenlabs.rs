//! ElevenLabs text-to-speech adapter

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use tracing::debug;

use crate::application::ports::{GenerationError, SpeechSynthesizer};
use crate::domain::config::DEFAULT_ELEVENLABS_VOICE;
use crate::domain::generation::Speech;
use crate::domain::media::DataUri;
use crate::infrastructure::audio::decode_audio;

use super::status_error;

const API_BASE_URL: &str = "https://api.elevenlabs.io";
const DEFAULT_MODEL: &str = "eleven_multilingual_v2";

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// ElevenLabs synthesizer returning MP3 data URIs
pub struct ElevenLabsSynthesizer {
    api_key: String,
    default_voice: String,
    base_url: String,
    client: reqwest::Client,
}

impl ElevenLabsSynthesizer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            default_voice: DEFAULT_ELEVENLABS_VOICE.to_string(),
            base_url: API_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.default_voice = voice.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn api_url(&self, voice: &str) -> String {
        format!("{}/v1/text-to-speech/{}", self.base_url, voice)
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<Speech, GenerationError> {
        let voice = voice.unwrap_or(self.default_voice.as_str());
        let response = self
            .client
            .post(self.api_url(voice))
            .header("xi-api-key", &self.api_key)
            .header(ACCEPT, "audio/mpeg")
            .json(&TtsRequest {
                text: text.trim(),
                model_id: DEFAULT_MODEL,
            })
            .send()
            .await
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?
            .to_vec();
        if bytes.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        // Duration comes from decoding the payload
        let payload = bytes.clone();
        let track = tokio::task::spawn_blocking(move || decode_audio(payload))
            .await
            .map_err(|e| GenerationError::Failed(e.to_string()))?
            .map_err(|e| GenerationError::ParseError(e.to_string()))?;

        debug!(voice, bytes = bytes.len(), secs = track.duration_secs(), "Synthesized speech");
        Ok(Speech {
            audio_url: DataUri::encode(&mime, &bytes),
            duration_secs: track.duration_secs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::audio::encode_to_flac;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn synthesizer(server: &MockServer) -> ElevenLabsSynthesizer {
        ElevenLabsSynthesizer::new("xi").with_base_url(server.uri())
    }

    #[tokio::test]
    async fn returns_audio_data_uri_with_duration() {
        let audio = encode_to_flac(&vec![0i16; 22_050], 1, 22_050).unwrap();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v1/text-to-speech/{}", DEFAULT_ELEVENLABS_VOICE)))
            .and(header("xi-api-key", "xi"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "audio/flac")
                    .set_body_bytes(audio),
            )
            .mount(&server)
            .await;

        let speech = synthesizer(&server).synthesize("Hello", None).await.unwrap();
        assert!(speech.audio_url.starts_with("data:audio/flac;base64,"));
        assert!((speech.duration_secs - 1.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn explicit_voice_is_used() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/text-to-speech/custom"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = synthesizer(&server).synthesize("Hi", Some("custom")).await.unwrap_err();
        assert!(matches!(err, GenerationError::InvalidApiKey));
    }

    #[tokio::test]
    async fn undecodable_audio_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"garbage".to_vec()))
            .mount(&server)
            .await;

        let err = synthesizer(&server).synthesize("Hi", None).await.unwrap_err();
        assert!(matches!(err, GenerationError::ParseError(_)));
    }
}
