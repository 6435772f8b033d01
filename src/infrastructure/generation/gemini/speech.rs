//! Gemini text-to-speech
//!
//! The model returns raw 16-bit little-endian PCM; it is wrapped as FLAC so
//! the resulting data URI is decodable by the compositor.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::json;
use tracing::debug;

use crate::application::ports::{GenerationError, SpeechSynthesizer};
use crate::domain::generation::Speech;
use crate::domain::media::DataUri;
use crate::infrastructure::audio::encode_to_flac;

use super::client::{GeminiClient, GenerateContentRequest, GenerationConfig};

const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-tts";
const DEFAULT_VOICE: &str = "Kore";

/// Output format of the TTS model when the MIME type carries no rate
const DEFAULT_SAMPLE_RATE: u32 = 24_000;

pub struct GeminiSpeechSynthesizer {
    client: GeminiClient,
    model: String,
}

impl GeminiSpeechSynthesizer {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    fn build_request(text: &str, voice: &str) -> GenerateContentRequest {
        GenerateContentRequest::user_text(text.trim()).with_config(GenerationConfig {
            response_modalities: Some(vec!["AUDIO".to_string()]),
            speech_config: Some(json!({
                "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } }
            })),
            ..Default::default()
        })
    }
}

/// Sample rate from a MIME type like `audio/L16;codec=pcm;rate=24000`
fn sample_rate_of(mime: &str) -> u32 {
    mime.split(';')
        .filter_map(|p| p.trim().strip_prefix("rate="))
        .find_map(|r| r.parse().ok())
        .unwrap_or(DEFAULT_SAMPLE_RATE)
}

/// Reinterpret little-endian bytes as i16 samples
fn pcm_samples(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}

#[async_trait]
impl SpeechSynthesizer for GeminiSpeechSynthesizer {
    async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<Speech, GenerationError> {
        let voice = voice.unwrap_or(DEFAULT_VOICE);
        let response = self
            .client
            .generate_content(&self.model, &Self::build_request(text, voice))
            .await?;

        let inline = response.inline_data().ok_or(GenerationError::EmptyResponse)?;
        let pcm = STANDARD
            .decode(&inline.data)
            .map_err(|e| GenerationError::ParseError(e.to_string()))?;
        if pcm.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        let rate = sample_rate_of(&inline.mime_type);
        let samples = pcm_samples(&pcm);
        let flac = encode_to_flac(&samples, 1, rate)
            .map_err(|e| GenerationError::Failed(e.to_string()))?;
        let duration_secs = samples.len() as f64 / rate as f64;

        debug!(voice, rate, duration_secs, "Synthesized speech");
        Ok(Speech {
            audio_url: DataUri::encode("audio/flac", &flac),
            duration_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn reads_rate_from_mime() {
        assert_eq!(sample_rate_of("audio/L16;codec=pcm;rate=16000"), 16_000);
        assert_eq!(sample_rate_of("audio/pcm"), DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn decodes_little_endian_pcm() {
        assert_eq!(pcm_samples(&[0x01, 0x00, 0xff, 0xff, 0x7f]), vec![1, -1]);
    }

    #[test]
    fn request_selects_voice() {
        let body =
            serde_json::to_value(GeminiSpeechSynthesizer::build_request("Hi", "Puck")).unwrap();
        let config = &body["generationConfig"];
        assert_eq!(config["responseModalities"][0], "AUDIO");
        assert_eq!(
            config["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
            "Puck"
        );
    }

    #[tokio::test]
    async fn wraps_pcm_as_flac_data_uri() {
        // Half a second of silence at 24 kHz
        let pcm = vec![0u8; 24_000];
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash-preview-tts:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"inlineData": {
                    "mimeType": "audio/L16;codec=pcm;rate=24000",
                    "data": STANDARD.encode(&pcm)
                }}]}}]
            })))
            .mount(&server)
            .await;

        let speech = GeminiSpeechSynthesizer::new(GeminiClient::with_base_url("k", server.uri()))
            .synthesize("Hello there", None)
            .await
            .unwrap();

        assert!(speech.audio_url.starts_with("data:audio/flac;base64,"));
        assert!((speech.duration_secs - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn missing_audio_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "sorry"}]}}]
            })))
            .mount(&server)
            .await;

        let err = GeminiSpeechSynthesizer::new(GeminiClient::with_base_url("k", server.uri()))
            .synthesize("Hello", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }
}
