//! Veo video generation through Gemini long-running operations

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::application::ports::{GenerationError, VideoGenerator};
use crate::domain::generation::{VideoJob, VideoJobStatus};
use crate::infrastructure::media::MediaFetcher;

use super::client::GeminiClient;

const DEFAULT_MODEL: &str = "veo-2.0-generate-001";

/// Portrait output, matching the compositor's usual target
const ASPECT_RATIO: &str = "9:16";

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<Instance>,
    parameters: Parameters,
}

#[derive(Debug, Serialize)]
struct Instance {
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<ImageInput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageInput {
    bytes_base64_encoded: String,
    mime_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters {
    aspect_ratio: String,
    sample_count: u32,
}

#[derive(Debug, Deserialize)]
struct Operation {
    name: Option<String>,
    #[serde(default)]
    done: bool,
    error: Option<OperationError>,
    response: Option<OperationResponse>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    generated_samples: Option<Vec<GeneratedSample>>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    video: Option<GeneratedVideo>,
}

#[derive(Debug, Deserialize)]
struct GeneratedVideo {
    uri: Option<String>,
}

impl Operation {
    fn video_uri(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .generate_video_response
            .as_ref()?
            .generated_samples
            .as_ref()?
            .first()?
            .video
            .as_ref()?
            .uri
            .as_deref()
    }
}

pub struct GeminiVideoGenerator {
    client: GeminiClient,
    fetcher: MediaFetcher,
    model: String,
}

impl GeminiVideoGenerator {
    /// `fetcher` resolves the optional first-frame image
    pub fn new(client: GeminiClient, fetcher: MediaFetcher) -> Self {
        Self {
            client,
            fetcher,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    async fn image_input(&self, url: &str) -> Result<ImageInput, GenerationError> {
        let fetched = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;
        Ok(ImageInput {
            bytes_base64_encoded: STANDARD.encode(&fetched.bytes),
            mime_type: fetched.content_type.unwrap_or_else(|| "image/png".to_string()),
        })
    }

    /// Generated files are only downloadable with the API key attached
    fn authorized(&self, uri: &str) -> String {
        let sep = if uri.contains('?') { '&' } else { '?' };
        format!("{}{}key={}", uri, sep, self.client.api_key())
    }
}

#[async_trait]
impl VideoGenerator for GeminiVideoGenerator {
    async fn submit(
        &self,
        prompt: &str,
        image_url: Option<&str>,
    ) -> Result<VideoJob, GenerationError> {
        let image = match image_url {
            Some(url) => Some(self.image_input(url).await?),
            None => None,
        };
        let body = PredictRequest {
            instances: vec![Instance {
                prompt: prompt.trim().to_string(),
                image,
            }],
            parameters: Parameters {
                aspect_ratio: ASPECT_RATIO.to_string(),
                sample_count: 1,
            },
        };

        let operation: Operation = self
            .client
            .post_json(&self.client.model_url(&self.model, "predictLongRunning"), &body)
            .await?;
        if let Some(error) = operation.error {
            return Err(GenerationError::ApiError(error.message));
        }
        let id = operation.name.ok_or(GenerationError::EmptyResponse)?;

        info!(job = %id, "Video generation submitted");
        Ok(VideoJob { id })
    }

    async fn poll(&self, job: &VideoJob) -> Result<VideoJobStatus, GenerationError> {
        let operation: Operation = self.client.get_json(&self.client.operation_url(&job.id)).await?;

        if let Some(error) = &operation.error {
            return Ok(VideoJobStatus::Failed(error.message.clone()));
        }
        if !operation.done {
            debug!(job = %job.id, "Video generation pending");
            return Ok(VideoJobStatus::Pending);
        }
        match operation.video_uri() {
            Some(uri) => Ok(VideoJobStatus::Done {
                video_url: self.authorized(uri),
            }),
            None => Ok(VideoJobStatus::Failed(
                "operation finished without a video".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generator(server: &MockServer) -> GeminiVideoGenerator {
        GeminiVideoGenerator::new(
            GeminiClient::with_base_url("k", server.uri()),
            MediaFetcher::new(None),
        )
    }

    fn job() -> VideoJob {
        VideoJob {
            id: "models/veo-2.0-generate-001/operations/op1".to_string(),
        }
    }

    #[tokio::test]
    async fn submit_returns_operation_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/veo-2.0-generate-001:predictLongRunning"))
            .and(body_partial_json(json!({
                "instances": [{
                    "prompt": "waves",
                    "image": {"bytesBase64Encoded": "aGk=", "mimeType": "image/png"}
                }],
                "parameters": {"aspectRatio": "9:16"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "models/veo-2.0-generate-001/operations/op1"
            })))
            .mount(&server)
            .await;

        let job = generator(&server)
            .submit(" waves ", Some("data:image/png;base64,aGk="))
            .await
            .unwrap();
        assert_eq!(job.id, "models/veo-2.0-generate-001/operations/op1");
    }

    #[tokio::test]
    async fn pending_operation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models/veo-2.0-generate-001/operations/op1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"name": "x", "done": false})),
            )
            .mount(&server)
            .await;

        assert_eq!(generator(&server).poll(&job()).await.unwrap(), VideoJobStatus::Pending);
    }

    #[tokio::test]
    async fn finished_operation_yields_keyed_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "done": true,
                "response": {"generateVideoResponse": {"generatedSamples": [
                    {"video": {"uri": "https://files.example/v1/clip:download?alt=media"}}
                ]}}
            })))
            .mount(&server)
            .await;

        assert_eq!(
            generator(&server).poll(&job()).await.unwrap(),
            VideoJobStatus::Done {
                video_url: "https://files.example/v1/clip:download?alt=media&key=k".to_string()
            }
        );
    }

    #[tokio::test]
    async fn failed_operation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "done": true,
                "error": {"message": "safety filter"}
            })))
            .mount(&server)
            .await;

        assert_eq!(
            generator(&server).poll(&job()).await.unwrap(),
            VideoJobStatus::Failed("safety filter".to_string())
        );
    }

    #[tokio::test]
    async fn quota_on_submit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = generator(&server).submit("waves", None).await.unwrap_err();
        assert!(matches!(err, GenerationError::QuotaExceeded));
    }
}
