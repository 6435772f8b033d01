//! Story manifest produced by the story generator

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of scenes a manifest must contain
pub const MANIFEST_SCENE_COUNT: usize = 5;

/// Error when a manifest violates its schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("Manifest has no title")]
    MissingTitle,

    #[error("Manifest must have exactly {expected} scenes, got {actual}")]
    SceneCount { expected: usize, actual: usize },

    #[error("Scene {index} is missing its {field}")]
    EmptyField { index: usize, field: &'static str },
}

/// One shot of the story
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Narration spoken over the shot
    pub narration: String,
    /// Prompt for the still image of the shot
    pub image_prompt: String,
}

/// Structured script and shot list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub title: String,
    pub scenes: Vec<Scene>,
}

impl Manifest {
    /// Check the strict schema: a title and exactly five filled scenes
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.title.trim().is_empty() {
            return Err(ManifestError::MissingTitle);
        }
        if self.scenes.len() != MANIFEST_SCENE_COUNT {
            return Err(ManifestError::SceneCount {
                expected: MANIFEST_SCENE_COUNT,
                actual: self.scenes.len(),
            });
        }
        for (index, scene) in self.scenes.iter().enumerate() {
            if scene.narration.trim().is_empty() {
                return Err(ManifestError::EmptyField {
                    index,
                    field: "narration",
                });
            }
            if scene.image_prompt.trim().is_empty() {
                return Err(ManifestError::EmptyField {
                    index,
                    field: "image prompt",
                });
            }
        }
        Ok(())
    }

    /// Narration of all scenes, in order, joined for speech synthesis
    pub fn full_narration(&self) -> String {
        self.scenes
            .iter()
            .map(|s| s.narration.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
