use crate::integration::Integration;
use crate::services::ServiceError;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event as SseEvent, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use chatgpt_plus_core::{ChatResult, DOMAIN};
use chatgpt_plus_ipc::service_messages::{
    no_agent_response, NO_AGENT_ERROR, SERVICE_NEW_CONVERSATION, SERVICE_SEND_MESSAGE,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Application state shared with all routes
#[derive(Clone)]
pub struct AppState {
    integration: Arc<Integration>,
}

/// Error type for HTTP server
#[derive(Debug)]
pub enum ApiError {
    /// One of the integration's own services, unregistered while no entry is loaded
    NoAgent,
    UnknownService(String),
    BadRequest(String),
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound {
                ref domain,
                ref service,
            } if is_own_service(domain, service) => Self::NoAgent,
            e @ ServiceError::NotFound { .. } => Self::UnknownService(e.to_string()),
            ServiceError::InvalidData(msg) => Self::BadRequest(msg),
        }
    }
}

fn is_own_service(domain: &str, service: &str) -> bool {
    domain == DOMAIN && (service == SERVICE_SEND_MESSAGE || service == SERVICE_NEW_CONVERSATION)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NoAgent => {
                warn!("Service called with no agent available");
                (StatusCode::NOT_FOUND, Json(no_agent_response())).into_response()
            }
            Self::UnknownService(msg) => {
                warn!(error = %msg, "Call to unknown service");
                let body = Json(ChatResult::failure(msg, None));
                (StatusCode::NOT_FOUND, body).into_response()
            }
            Self::BadRequest(msg) => {
                warn!(error = %msg, "Rejected service call");
                let body = Json(json!({ "success": false, "error": msg }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
        }
    }
}

/// Build the router
pub fn router(integration: Arc<Integration>) -> Router {
    let state = AppState { integration };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/services/{domain}/{service}", post(call_service))
        .route("/api/events", get(events))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server, stopping on Ctrl-C
pub async fn run_server(integration: Arc<Integration>, addr: SocketAddr) -> anyhow::Result<()> {
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;

    axum::serve(listener, router(integration))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutting down HTTP server");
        })
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Status of the sidecar the services are bound to
async fn status(State(state): State<AppState>) -> Response {
    match state.integration.primary_agent().await {
        Some(agent) => Json(agent.get_status().await).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": NO_AGENT_ERROR })),
        )
            .into_response(),
    }
}

async fn call_service(
    State(state): State<AppState>,
    Path((domain, service)): Path<(String, String)>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let data: Value = if body.iter().all(u8::is_ascii_whitespace) {
        json!({})
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?
    };

    let result = state
        .integration
        .services()
        .call(&domain, &service, data)
        .await?;
    Ok(Json(result).into_response())
}

/// Server-sent stream of bus events. Lagging subscribers skip what they missed.
async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let stream = BroadcastStream::new(state.integration.bus().subscribe()).filter_map(|msg| {
        let event = match msg {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Event subscriber lagged");
                return None;
            }
        };
        match SseEvent::default().event(&event.event_type).json_data(&event) {
            Ok(sse) => Some(Ok(sse)),
            Err(e) => {
                error!(error = %e, "Failed to encode event");
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
