//! Typed view over the completion payload.
//!
//! The payload stays opaque to the session; this view is only a
//! convenience for callers that know the generation backend's shape.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerationResult {
    #[serde(default)]
    pub resume: serde_json::Value,
    #[serde(default)]
    pub scores: GenerationScores,
    #[serde(default)]
    pub paths: GenerationPaths,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerationScores {
    #[serde(default)]
    pub evaluation: Option<serde_json::Value>,
    #[serde(default)]
    pub factuality: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerationPaths {
    #[serde(default)]
    pub json_path: Option<String>,
    #[serde(default)]
    pub docx_path: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
}

impl GenerationResult {
    /// Interpret a completion payload. Returns `None` if it is not an object.
    pub fn from_payload(payload: &serde_json::Value) -> Option<Self> {
        if !payload.is_object() {
            return None;
        }
        serde_json::from_value(payload.clone()).ok()
    }

    /// Total evaluation score, if the backend reported one.
    pub fn evaluation_score(&self) -> Option<f64> {
        self.scores
            .evaluation
            .as_ref()
            .and_then(|e| e.get("total_score"))
            .and_then(|s| s.as_f64())
    }
}
