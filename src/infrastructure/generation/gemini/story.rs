//! Gemini story manifest generator
//!
//! Uses structured output: the model is constrained to a JSON schema with a
//! title and exactly five scenes.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::application::ports::{GenerationError, StoryGenerator};
use crate::domain::generation::{Manifest, MANIFEST_SCENE_COUNT};

use super::client::{GeminiClient, GenerateContentRequest, GenerationConfig};

const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const SYSTEM_PROMPT: &str = "You are a storyboard writer for short vertical videos. \
Each scene has one or two sentences of narration and a detailed, purely visual \
image prompt with no text in the picture.";

pub struct GeminiStoryGenerator {
    client: GeminiClient,
    model: String,
}

impl GeminiStoryGenerator {
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

    /// JSON schema of the manifest
    fn response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "scenes": {
                    "type": "ARRAY",
                    "minItems": MANIFEST_SCENE_COUNT,
                    "maxItems": MANIFEST_SCENE_COUNT,
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "narration": { "type": "STRING" },
                            "imagePrompt": { "type": "STRING" }
                        },
                        "required": ["narration", "imagePrompt"]
                    }
                }
            },
            "required": ["title", "scenes"]
        })
    }

    fn build_request(idea: &str, style_hints: &[String]) -> GenerateContentRequest {
        let mut prompt = format!(
            "Write a {}-scene story for this idea: {}",
            MANIFEST_SCENE_COUNT,
            idea.trim()
        );
        let hints: Vec<&str> = style_hints
            .iter()
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .collect();
        if !hints.is_empty() {
            prompt.push_str(&format!("\nVisual style: {}", hints.join(", ")));
        }

        GenerateContentRequest::user_text(prompt)
            .with_system(SYSTEM_PROMPT)
            .with_config(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(Self::response_schema()),
                ..Default::default()
            })
    }
}

#[async_trait]
impl StoryGenerator for GeminiStoryGenerator {
    async fn generate_manifest(
        &self,
        idea: &str,
        style_hints: &[String],
    ) -> Result<Manifest, GenerationError> {
        let response = self
            .client
            .generate_content(&self.model, &Self::build_request(idea, style_hints))
            .await?;

        // A cut-off JSON document never parses; report the cause instead
        if response.is_truncated() {
            return Err(GenerationError::Truncated);
        }

        let text = response.text().ok_or(GenerationError::EmptyResponse)?;
        let manifest: Manifest = serde_json::from_str(text.trim())
            .map_err(|e| GenerationError::ParseError(e.to_string()))?;
        debug!(title = %manifest.title, scenes = manifest.scenes.len(), "Parsed manifest");
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn manifest_json() -> String {
        let scenes: Vec<Value> = (0..5)
            .map(|i| {
                json!({"narration": format!("Line {}", i), "imagePrompt": format!("Shot {}", i)})
            })
            .collect();
        json!({"title": "Tides", "scenes": scenes}).to_string()
    }

    async fn serve(body: Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    fn generator(server: &MockServer) -> GeminiStoryGenerator {
        GeminiStoryGenerator::new(GeminiClient::with_base_url("k", server.uri()))
    }

    #[test]
    fn request_uses_json_schema() {
        let body = serde_json::to_value(GeminiStoryGenerator::build_request(
            "a lighthouse keeper",
            &["watercolor".to_string(), " ".to_string()],
        ))
        .unwrap();

        let config = &body["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(config["responseSchema"]["properties"]["scenes"]["maxItems"], 5);
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.ends_with("Visual style: watercolor"));
    }

    #[tokio::test]
    async fn parses_manifest() {
        let server = serve(json!({
            "candidates": [{
                "content": {"parts": [{"text": manifest_json()}]},
                "finishReason": "STOP"
            }]
        }))
        .await;

        let manifest = generator(&server).generate_manifest("tides", &[]).await.unwrap();
        assert_eq!(manifest.title, "Tides");
        assert_eq!(manifest.scenes[4].image_prompt, "Shot 4");
    }

    #[tokio::test]
    async fn truncation_is_distinct_from_parse_error() {
        let server = serve(json!({
            "candidates": [{
                "content": {"parts": [{"text": "{\"title\": \"Ti"}]},
                "finishReason": "MAX_TOKENS"
            }]
        }))
        .await;

        let err = generator(&server).generate_manifest("tides", &[]).await.unwrap_err();
        assert!(matches!(err, GenerationError::Truncated));
    }

    #[tokio::test]
    async fn malformed_json_is_parse_error() {
        let server = serve(json!({
            "candidates": [{"content": {"parts": [{"text": "not json"}]}, "finishReason": "STOP"}]
        }))
        .await;

        let err = generator(&server).generate_manifest("tides", &[]).await.unwrap_err();
        assert!(matches!(err, GenerationError::ParseError(_)));
    }
}
