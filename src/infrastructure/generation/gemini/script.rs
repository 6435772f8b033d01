//! Gemini narration script writer

use async_trait::async_trait;

use crate::application::ports::{GenerationError, ScriptGenerator};
use crate::domain::generation::Script;

use super::client::{GeminiClient, GenerateContentRequest, GenerationConfig};

const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const SYSTEM_PROMPT: &str = "You write narration for short vertical videos. \
Reply with the narration only: no title, no stage directions, no markdown. \
Keep it under 120 words so it reads aloud in under a minute.";

pub struct GeminiScriptGenerator {
    client: GeminiClient,
    model: String,
}

impl GeminiScriptGenerator {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn build_request(topic: &str, tone: &str) -> GenerateContentRequest {
        GenerateContentRequest::user_text(format!(
            "Write a {} narration script about: {}",
            tone.trim(),
            topic.trim()
        ))
        .with_system(SYSTEM_PROMPT)
        .with_config(GenerationConfig {
            temperature: Some(0.9),
            ..Default::default()
        })
    }
}

#[async_trait]
impl ScriptGenerator for GeminiScriptGenerator {
    async fn generate_script(&self, topic: &str, tone: &str) -> Result<Script, GenerationError> {
        let response = self
            .client
            .generate_content(&self.model, &Self::build_request(topic, tone))
            .await?;

        let text = response.text().ok_or(GenerationError::EmptyResponse)?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(Script::generated(trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generator(server: &MockServer) -> GeminiScriptGenerator {
        GeminiScriptGenerator::new(GeminiClient::with_base_url("k", server.uri()))
    }

    #[test]
    fn request_carries_topic_and_tone() {
        let body =
            serde_json::to_value(GeminiScriptGenerator::build_request("tides", "calm")).unwrap();
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("calm"));
        assert!(prompt.contains("tides"));
        assert!(body["systemInstruction"].is_object());
    }

    #[tokio::test]
    async fn returns_trimmed_script() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(query_param("key", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "  The sea breathes.  "}]}}]
            })))
            .mount(&server)
            .await;

        let script = generator(&server).generate_script("tides", "calm").await.unwrap();
        assert_eq!(script.text, "The sea breathes.");
        assert!(!script.is_placeholder);
    }

    #[tokio::test]
    async fn quota_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = generator(&server).generate_script("a", "b").await.unwrap_err();
        assert!(matches!(err, GenerationError::QuotaExceeded));
    }

    #[tokio::test]
    async fn blank_text_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "   "}]}}]
            })))
            .mount(&server)
            .await;

        let err = generator(&server).generate_script("a", "b").await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    #[tokio::test]
    async fn body_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": {"message": "model overloaded", "code": 503}
            })))
            .mount(&server)
            .await;

        match generator(&server).generate_script("a", "b").await {
            Err(GenerationError::ApiError(msg)) => assert_eq!(msg, "model overloaded"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
