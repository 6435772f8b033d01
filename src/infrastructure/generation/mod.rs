//! Generative collaborator adapters

mod elevenlabs;
mod gemini;
mod pollinations;

pub use elevenlabs::ElevenLabsSynthesizer;
pub use gemini::{
    GeminiClient, GeminiScriptGenerator, GeminiSpeechSynthesizer, GeminiStoryGenerator,
    GeminiVideoGenerator,
};
pub use pollinations::PollinationsImageGenerator;

use reqwest::StatusCode;

use crate::application::ports::GenerationError;

/// Map a non-success HTTP status to a generation error
pub(crate) fn status_error(status: StatusCode, body: &str) -> GenerationError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationError::InvalidApiKey,
        StatusCode::TOO_MANY_REQUESTS => GenerationError::QuotaExceeded,
        _ => GenerationError::ApiError(format!("HTTP {}: {}", status, body.trim())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_quota_and_auth_statuses() {
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, ""),
            GenerationError::QuotaExceeded
        ));
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, ""),
            GenerationError::InvalidApiKey
        ));
        match status_error(StatusCode::INTERNAL_SERVER_ERROR, " boom ") {
            GenerationError::ApiError(msg) => assert!(msg.ends_with("boom")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
