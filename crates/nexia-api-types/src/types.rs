//! Request and response payloads for the backend endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /execute`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    /// The source text to run on the server.
    pub code: String,
}

impl ExecuteRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

/// Result of a server-side execution.
///
/// The backend answers either flat (`{ success, output, error }`) or wrapped in
/// its usual `{ success, data: { ... } }` envelope; both shapes deserialize here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ExecuteData>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecuteResponse {
    /// Captured stdout, looking inside the envelope when the flat field is absent.
    pub fn output_text(&self) -> Option<&str> {
        self.output
            .as_deref()
            .or_else(|| self.data.as_ref().and_then(|d| d.output.as_deref()))
    }

    /// Error text, looking inside the envelope when the flat field is absent.
    pub fn error_text(&self) -> Option<&str> {
        self.error
            .as_deref()
            .or_else(|| self.data.as_ref().and_then(|d| d.error.as_deref()))
    }
}

/// Body of `POST /exercises/{id}/submit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub code: String,
}

/// Backend acknowledgement of a submission. Grading details are opaque to the
/// console and kept as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Value,
}
