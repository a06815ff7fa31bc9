use anyhow::{anyhow, Context, Result};
use chatgpt_plus_core::{normalize_url, SidecarStatus};
use chatgpt_plus_ipc::events::Event;
use chatgpt_plus_ipc::service_messages::{
    service_path, SendMessageData, ServiceResponse, SERVICE_NEW_CONVERSATION,
    SERVICE_SEND_MESSAGE,
};
use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// HTTP client for the bridge daemon
#[derive(Debug, Clone)]
pub struct BridgeClient {
    client: Client,
    base_url: String,
}

impl BridgeClient {
    pub fn new(base_url: &str) -> Self {
        let base_url = normalize_url(base_url);
        info!("Using bridge daemon at {}", base_url);
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Whether the daemon answers its health check
    pub async fn test_connection(&self) -> bool {
        match self.client.get(self.url("/health")).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!("Daemon health check returned {}", response.status());
                false
            }
            Err(e) => {
                warn!("Daemon health check failed: {}", e);
                false
            }
        }
    }

    /// Status of the sidecar the daemon's services use. With no entry loaded
    /// the returned status only carries an error.
    #[instrument(skip(self))]
    pub async fn status(&self) -> Result<SidecarStatus> {
        let response = self
            .client
            .get(self.url("/api/status"))
            .send()
            .await
            .with_context(|| format!("Failed to connect to daemon at {}", self.base_url))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .context("Failed to read status response")?;
        serde_json::from_slice(&body)
            .with_context(|| format!("Unexpected status response from daemon ({})", status))
    }

    pub async fn send_message(&self, message: &str) -> Result<ServiceResponse> {
        let data = SendMessageData {
            message: message.to_string(),
        };
        self.call_service(SERVICE_SEND_MESSAGE, &data).await
    }

    pub async fn new_conversation(&self) -> Result<ServiceResponse> {
        self.call_service(SERVICE_NEW_CONVERSATION, &serde_json::json!({}))
            .await
    }

    /// Calls a service. Rejected calls still answer with a result record,
    /// so only transport failures and unknown bodies are errors.
    #[instrument(skip(self, data))]
    async fn call_service<T: Serialize>(&self, service: &str, data: &T) -> Result<ServiceResponse> {
        let response = self
            .client
            .post(self.url(&service_path(service)))
            .json(data)
            .send()
            .await
            .with_context(|| format!("Failed to connect to daemon at {}", self.base_url))?;

        let status = response.status();
        debug!("Service {} answered {}", service, status);
        let body = response
            .bytes()
            .await
            .context("Failed to read service response")?;
        serde_json::from_slice(&body)
            .map_err(|e| anyhow!("Daemon returned {} with an unexpected body: {}", status, e))
    }

    /// Subscribes to the daemon's event stream
    pub async fn events(&self) -> Result<EventStream> {
        let response = self
            .client
            .get(self.url("/api/events"))
            .send()
            .await
            .with_context(|| format!("Failed to connect to daemon at {}", self.base_url))?
            .error_for_status()
            .context("Daemon refused the event stream")?;
        Ok(EventStream {
            bytes: response
                .bytes_stream()
                .map(|chunk| chunk.map(|b| b.to_vec()))
                .boxed(),
            buffer: Vec::new(),
        })
    }
}

/// Server-sent events decoded into bus events.
/// Bytes are buffered until a block is complete, so characters split
/// across network chunks decode intact.
pub struct EventStream {
    bytes: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    buffer: Vec<u8>,
}

impl EventStream {
    /// Next event, or `None` when the daemon closes the stream
    pub async fn next_event(&mut self) -> Result<Option<Event>> {
        loop {
            while let Some(end) = self.buffer.windows(2).position(|w| w == b"\n\n") {
                let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
                let block = String::from_utf8(block).context("Event stream is not valid UTF-8")?;
                if let Some(data) = parse_sse_data(&block) {
                    let event = serde_json::from_str(&data)
                        .with_context(|| format!("Invalid event data: {}", data))?;
                    return Ok(Some(event));
                }
            }

            match self.bytes.next().await {
                Some(chunk) => {
                    let chunk = chunk.context("Event stream interrupted")?;
                    // CR never occurs inside a UTF-8 sequence
                    self.buffer.extend(chunk.into_iter().filter(|&b| b != b'\r'));
                }
                None => return Ok(None),
            }
        }
    }
}

/// Joined `data:` lines of one SSE block. Keep-alive comments have none.
fn parse_sse_data(block: &str) -> Option<String> {
    let lines: Vec<&str> = block
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
