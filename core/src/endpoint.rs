/// Liveness probe, answers `{"status": "healthy"}` once the sidecar is ready.
pub const API_HEALTH: &str = "/health";
/// Login probe, answers `{"isLoggedIn": bool, ...}`.
pub const API_STATUS: &str = "/api/status";
pub const API_CHAT: &str = "/api/chat";
pub const API_NEW_CONVERSATION: &str = "/api/conversation/new";

/// Strips surrounding whitespace and any trailing slashes from a sidecar URL.
pub fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Base URL of a sidecar and the fixed paths derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarEndpoint {
    base_url: String,
}

impl SidecarEndpoint {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_url(base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url, API_HEALTH)
    }

    pub fn status_url(&self) -> String {
        format!("{}{}", self.base_url, API_STATUS)
    }

    pub fn chat_url(&self) -> String {
        format!("{}{}", self.base_url, API_CHAT)
    }

    pub fn new_conversation_url(&self) -> String {
        format!("{}{}", self.base_url, API_NEW_CONVERSATION)
    }
}
