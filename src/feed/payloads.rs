//! Feed payload deserialization structs

use serde::Deserialize;

/// Raw JSON object carried on a `data:` line.
///
/// `progress` is kept as a raw value so out-of-range or fractional numbers
/// can be clamped instead of rejected.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StagePayload {
    pub stage: String,
    pub message: String,
    #[serde(default)]
    pub progress: Option<serde_json::Value>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StagePayload {
    /// Progress normalized into 0..=100. Missing or non-numeric values read as 0.
    pub fn clamped_progress(&self) -> u8 {
        let Some(value) = self.progress.as_ref() else {
            return 0;
        };
        if let Some(n) = value.as_i64() {
            return n.clamp(0, 100) as u8;
        }
        if let Some(n) = value.as_u64() {
            return n.min(100) as u8;
        }
        match value.as_f64() {
            Some(f) if f.is_finite() => f.trunc().clamp(0.0, 100.0) as u8,
            _ => 0,
        }
    }
}
