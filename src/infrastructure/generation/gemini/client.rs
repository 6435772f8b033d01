//! Shared Gemini REST client and wire types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::ports::GenerationError;

use crate::infrastructure::generation::status_error;

/// Gemini API base URL
pub const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// Request types for the Gemini API

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Single user turn with a text prompt
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![TextPart { text: text.into() }],
            }],
            system_instruction: None,
            generation_config: None,
        }
    }

    pub fn with_system(mut self, text: impl Into<String>) -> Self {
        self.system_instruction = Some(SystemInstruction {
            parts: vec![TextPart { text: text.into() }],
        });
        self
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }
}

#[derive(Debug, Serialize)]
pub(super) struct Content {
    pub role: String,
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
pub(super) struct SystemInstruction {
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
pub(super) struct TextPart {
    pub text: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<Value>,
}

// Response types for the Gemini API

#[derive(Debug, Deserialize)]
pub(super) struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CandidateContent {
    pub parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ResponsePart {
    pub text: Option<String>,
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ApiError {
    pub message: String,
}

impl GenerateContentResponse {
    fn first_candidate(&self) -> Option<&Candidate> {
        self.candidates.as_ref()?.first()
    }

    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.first_candidate()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.as_ref())
            .into_iter()
            .flatten()
    }

    /// Concatenated text parts of the first candidate
    pub fn text(&self) -> Option<String> {
        let parts: Vec<&str> = self.parts().filter_map(|p| p.text.as_deref()).collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(""))
        }
    }

    /// First inline payload of the first candidate
    pub fn inline_data(&self) -> Option<&InlineData> {
        self.parts().find_map(|p| p.inline_data.as_ref())
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.first_candidate()?.finish_reason.as_deref()
    }

    pub fn is_truncated(&self) -> bool {
        self.finish_reason() == Some("MAX_TOKENS")
    }
}

/// Thin client shared by the Gemini adapters
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, API_BASE_URL)
    }

    /// Point the client at another endpoint (tests, proxies)
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// URL of a model method, e.g. `generateContent`
    pub fn model_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.base_url, model, method, self.api_key
        )
    }

    /// URL of a long-running operation
    pub fn operation_url(&self, name: &str) -> String {
        format!("{}/{}?key={}", self.base_url, name, self.api_key)
    }

    /// POST a JSON body and decode the JSON reply
    pub async fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R, GenerationError>
    where
        B: Serialize + ?Sized + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;
        Self::decode(response).await
    }

    /// GET and decode the JSON reply
    pub async fn get_json<R>(&self, url: &str) -> Result<R, GenerationError>
    where
        R: for<'de> Deserialize<'de>,
    {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;
        Self::decode(response).await
    }

    async fn decode<R>(response: reqwest::Response) -> Result<R, GenerationError>
    where
        R: for<'de> Deserialize<'de>,
    {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| GenerationError::ParseError(e.to_string()))
    }

    /// Call `generateContent` and surface body-level errors
    pub(super) async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let response: GenerateContentResponse = self
            .post_json(&self.model_url(model, "generateContent"), request)
            .await?;

        if let Some(error) = &response.error {
            return Err(GenerationError::ApiError(error.message.clone()));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn model_url_contains_model_and_key() {
        let client = GeminiClient::with_base_url("test-key", "http://localhost:9/v1beta/");
        let url = client.model_url("gemini-2.0-flash", "generateContent");
        assert_eq!(
            url,
            "http://localhost:9/v1beta/models/gemini-2.0-flash:generateContent?key=test-key"
        );
    }

    #[test]
    fn extracts_joined_text() {
        let r = response(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world"}]},
                "finishReason":"STOP"}]}"#,
        );
        assert_eq!(r.text().as_deref(), Some("Hello world"));
        assert!(!r.is_truncated());
    }

    #[test]
    fn detects_truncation() {
        let r = response(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"ti"}]},
                "finishReason":"MAX_TOKENS"}]}"#,
        );
        assert!(r.is_truncated());
    }

    #[test]
    fn extracts_inline_data() {
        let r = response(
            r#"{"candidates":[{"content":{"parts":[
                {"inlineData":{"mimeType":"audio/L16;rate=24000","data":"AAA="}}
            ]}}]}"#,
        );
        let data = r.inline_data().unwrap();
        assert_eq!(data.mime_type, "audio/L16;rate=24000");
        assert!(r.text().is_none());
    }

    #[test]
    fn empty_response_has_no_text() {
        let r = response(r#"{}"#);
        assert!(r.text().is_none());
        assert!(r.finish_reason().is_none());
    }

    #[test]
    fn request_omits_empty_fields() {
        let body = serde_json::to_value(GenerateContentRequest::user_text("hi")).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
        assert!(body.get("systemInstruction").is_none());
        assert!(body.get("generationConfig").is_none());
    }
}
