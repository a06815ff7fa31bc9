use reqwest::StatusCode;
use thiserror::Error;

use crate::types::ErrorBody;

/// Transport and protocol failures while talking to the sidecar.
///
/// These never leave the client: every public [`crate::SidecarClient`] call
/// folds them into a result record instead.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request to sidecar timed out")]
    Timeout,

    #[error("Status {status_code}")]
    HttpError {
        status_code: u16,
        error: Option<String>,
        message: Option<String>,
    },

    #[error(transparent)]
    ReqwestError(reqwest::Error),

    #[error("Parsing Error: {0}")]
    ParsingError(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::ReqwestError(e)
        }
    }
}

impl ClientError {
    /// Builds an [`ClientError::HttpError`] from a non-200 response body.
    /// Bodies that are not JSON (or not the expected shape) leave both fields empty.
    pub(crate) fn from_error_body(status: StatusCode, body: &[u8]) -> Self {
        let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
        ClientError::HttpError {
            status_code: status.as_u16(),
            error: parsed.error,
            message: parsed.message,
        }
    }
}

/// Result type for sidecar requests
pub type ClientResult<T> = Result<T, ClientError>;

/// Reasons the setup-time connection probe rejects a sidecar URL
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("Cannot connect to the sidecar")]
    CannotConnect,

    #[error("Timed out waiting for the sidecar")]
    Timeout,

    #[error("The sidecar is running but not ready yet")]
    SidecarNotReady,

    #[error("The sidecar is not logged in to ChatGPT")]
    NotLoggedIn,

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl SetupError {
    /// Stable error code shown next to the setup form
    pub fn code(&self) -> &'static str {
        match self {
            SetupError::CannotConnect => "cannot_connect",
            SetupError::Timeout => "timeout",
            SetupError::SidecarNotReady => "sidecar_not_ready",
            SetupError::NotLoggedIn => "not_logged_in",
            SetupError::Unknown(_) => "unknown",
        }
    }
}

/// Errors reading or writing the config entry store
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Config entry not found: {0}")]
    EntryNotFound(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;
