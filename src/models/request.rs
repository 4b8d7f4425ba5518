use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate/stream`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateRequest {
    pub username: String,
    /// Full job description text
    pub jd_text: String,
    pub company: String,
    pub role: String,
    /// Run the evaluation and factuality revision loops
    #[serde(default = "default_optimize")]
    pub optimize: bool,
}

fn default_optimize() -> bool {
    true
}

impl GenerateRequest {
    /// Create a request with optimization enabled
    pub fn new(
        username: impl Into<String>,
        jd_text: impl Into<String>,
        company: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            jd_text: jd_text.into(),
            company: company.into(),
            role: role.into(),
            optimize: true,
        }
    }

    /// Enable or disable the optimization loops
    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    /// Names of required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.jd_text.trim().is_empty() {
            missing.push("jd_text");
        }
        if self.company.trim().is_empty() {
            missing.push("company");
        }
        if self.role.trim().is_empty() {
            missing.push("role");
        }
        missing
    }
}
