use reqwest::{Client, StatusCode};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

use crate::config::Timeouts;
use crate::endpoint::SidecarEndpoint;
use crate::errors::{ClientError, ClientResult};
use crate::types::{ChatRequest, ChatResult, SidecarStatus};

/// Agent for talking to ChatGPT through the sidecar.
///
/// Every public call returns a result record and never fails: transport and
/// protocol errors are translated here and nowhere else.
///
/// The conversation id is guarded by an async mutex that is held for the
/// whole chat turn, so concurrent calls on one agent run one after another
/// and each reply lands in the conversation it was sent in.
#[derive(Debug)]
pub struct SidecarClient {
    client: Client,
    endpoint: SidecarEndpoint,
    timeouts: Timeouts,
    conversation_id: Mutex<Option<String>>,
}

impl SidecarClient {
    /// Create a new agent on top of a shared HTTP client
    pub fn new(client: Client, sidecar_url: &str, timeouts: Timeouts) -> Self {
        Self {
            client,
            endpoint: SidecarEndpoint::new(sidecar_url),
            timeouts,
            conversation_id: Mutex::new(None),
        }
    }

    pub fn endpoint(&self) -> &SidecarEndpoint {
        &self.endpoint
    }

    /// Id of the current conversation, if a chat reply has set one.
    /// Waits for an in-flight chat turn to finish.
    pub async fn conversation_id(&self) -> Option<String> {
        self.conversation_id.lock().await.clone()
    }

    /// Get the current status from the sidecar
    #[instrument(skip(self), fields(sidecar = %self.endpoint.base_url()))]
    pub async fn get_status(&self) -> SidecarStatus {
        match self.fetch_status().await {
            Ok(status) => status,
            Err(ClientError::HttpError { status_code, .. }) => {
                SidecarStatus::from_error(format!("Status {}", status_code))
            }
            Err(e) => {
                error!(error = %e, "Error getting status");
                SidecarStatus::from_error(e.to_string())
            }
        }
    }

    /// Send a message to ChatGPT and get the response
    #[instrument(skip(self, message), fields(sidecar = %self.endpoint.base_url(), message_len = message.len()))]
    pub async fn send_message(&self, message: &str) -> ChatResult {
        let mut conversation_id = self.conversation_id.lock().await;

        let request = ChatRequest {
            message: message.to_string(),
            conversation_id: conversation_id.clone(),
        };

        match self.post_chat(&request).await {
            Ok(result) => {
                if let Some(id) = result.conversation_id.as_deref().filter(|id| !id.is_empty()) {
                    if conversation_id.as_deref() != Some(id) {
                        info!(conversation_id = id, "Conversation id updated");
                    }
                    *conversation_id = Some(id.to_string());
                }
                result
            }
            Err(ClientError::Timeout) => {
                error!("Timeout waiting for ChatGPT response");
                ChatResult::timeout()
            }
            Err(ClientError::HttpError {
                status_code,
                error,
                message,
            }) => {
                error!(status_code, ?error, "Sidecar rejected chat message");
                ChatResult::failure(
                    error.unwrap_or_else(|| format!("Status {}", status_code)),
                    Some(message.unwrap_or_else(|| "Unknown error".to_string())),
                )
            }
            Err(e) => {
                error!(error = %e, "Error sending message");
                ChatResult::exception(e.to_string())
            }
        }
    }

    /// Start a new conversation. A 200 reply always forgets the current
    /// conversation id, whatever the body says.
    #[instrument(skip(self), fields(sidecar = %self.endpoint.base_url()))]
    pub async fn new_conversation(&self) -> ChatResult {
        let mut conversation_id = self.conversation_id.lock().await;

        match self.post_new_conversation(&mut conversation_id).await {
            Ok(result) => result,
            Err(ClientError::HttpError {
                status_code, error, ..
            }) => ChatResult::failure(
                error.unwrap_or_else(|| format!("Status {}", status_code)),
                None,
            ),
            Err(e) => {
                error!(error = %e, "Error starting new conversation");
                ChatResult::failure(e.to_string(), None)
            }
        }
    }

    async fn fetch_status(&self) -> ClientResult<SidecarStatus> {
        let response = self
            .client
            .get(self.endpoint.status_url())
            .timeout(self.timeouts.status)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if status != StatusCode::OK {
            return Err(ClientError::from_error_body(status, &body));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn post_chat(&self, request: &ChatRequest) -> ClientResult<ChatResult> {
        debug!(
            has_conversation = request.conversation_id.is_some(),
            "Posting chat message"
        );
        let response = self
            .client
            .post(self.endpoint.chat_url())
            .json(request)
            .timeout(self.timeouts.chat)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if status != StatusCode::OK {
            return Err(ClientError::from_error_body(status, &body));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn post_new_conversation(
        &self,
        conversation_id: &mut Option<String>,
    ) -> ClientResult<ChatResult> {
        let response = self
            .client
            .post(self.endpoint.new_conversation_url())
            .timeout(self.timeouts.new_conversation)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.bytes().await?;
            return Err(ClientError::from_error_body(status, &body));
        }

        if let Some(previous) = conversation_id.take() {
            info!(conversation_id = %previous, "Cleared conversation id");
        }

        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(ChatResult::success(None));
        }
        Ok(serde_json::from_slice(&body)?)
    }
}
