use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::Timeouts;
use crate::endpoint::SidecarEndpoint;
use crate::errors::SetupError;
use crate::types::{HealthResponse, SidecarStatus};

/// Probes a candidate sidecar before it is configured.
///
/// Checks `/health` and then `/api/status`, stopping at the first failure.
/// Returns the normalized base URL on success. Nothing is retried.
#[instrument(skip(client, timeouts))]
pub async fn validate_connection(
    client: &Client,
    sidecar_url: &str,
    timeouts: &Timeouts,
) -> Result<String, SetupError> {
    let endpoint = SidecarEndpoint::new(sidecar_url);

    let response = probe(client, &endpoint.health_url(), timeouts.health).await?;
    if response.status() != StatusCode::OK {
        warn!(status = %response.status(), "Sidecar health check failed");
        return Err(SetupError::CannotConnect);
    }
    let health: HealthResponse = read_json(response).await?;
    if !health.is_healthy() {
        warn!(status = ?health.status, "Sidecar is not healthy yet");
        return Err(SetupError::SidecarNotReady);
    }

    let response = probe(client, &endpoint.status_url(), timeouts.status).await?;
    let logged_in = if response.status() == StatusCode::OK {
        read_json::<SidecarStatus>(response).await?.is_logged_in()
    } else {
        // Error bodies carry no login flag
        warn!(status = %response.status(), "Sidecar status check failed");
        false
    };
    if !logged_in {
        return Err(SetupError::NotLoggedIn);
    }

    info!(sidecar_url = %endpoint.base_url(), "Sidecar connection validated");
    Ok(endpoint.base_url().to_string())
}

async fn probe(client: &Client, url: &str, timeout: Duration) -> Result<Response, SetupError> {
    debug!(url, "Probing sidecar");
    client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(classify)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, SetupError> {
    let body = response.bytes().await.map_err(classify)?;
    serde_json::from_slice(&body).map_err(|e| SetupError::Unknown(e.to_string()))
}

fn classify(e: reqwest::Error) -> SetupError {
    if e.is_timeout() {
        SetupError::Timeout
    } else if e.is_connect() {
        SetupError::CannotConnect
    } else {
        warn!(error = %e, "Unexpected error validating sidecar");
        SetupError::Unknown(e.to_string())
    }
}
