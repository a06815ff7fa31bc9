use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message returned to callers when a chat turn exceeds its timeout
pub const TIMEOUT_MESSAGE: &str = "ChatGPT took too long to respond";

/// Body of `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// Normalized outcome of a chat or new-conversation call.
///
/// Successful sidecar replies are passed through as-is, so any field the
/// sidecar adds beyond the known ones is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResult {
    /// Absent when the sidecar's reply did not carry it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatResult {
    pub fn success(message: Option<String>) -> Self {
        Self {
            success: Some(true),
            message,
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>, message: Option<String>) -> Self {
        Self {
            success: Some(false),
            error: Some(error.into()),
            message,
            ..Default::default()
        }
    }

    /// A missing `success` flag counts as a failure
    pub fn is_success(&self) -> bool {
        self.success.unwrap_or(false)
    }

    pub fn timeout() -> Self {
        Self::failure("timeout", Some(TIMEOUT_MESSAGE.to_string()))
    }

    pub fn exception(message: impl Into<String>) -> Self {
        Self::failure("exception", Some(message.into()))
    }
}

/// Error payload the sidecar sends alongside non-200 responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `GET /health`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status.as_deref() == Some("healthy")
    }
}

/// Body of `GET /api/status`, or the error that prevented fetching it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidecarStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_logged_in: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headless: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SidecarStatus {
    pub fn from_error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Missing or `false` both count as logged out
    pub fn is_logged_in(&self) -> bool {
        self.is_logged_in.unwrap_or(false)
    }
}
