use async_trait::async_trait;
use chatgpt_plus_core::SidecarClient;
use chatgpt_plus_ipc::events::ResponseEventData;
use chatgpt_plus_ipc::service_messages::{SendMessageData, ServiceResponse};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::events::EventBus;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Service not found: {domain}.{service}")]
    NotFound { domain: String, service: String },
    #[error("Invalid service data: {0}")]
    InvalidData(String),
}

/// Something that can answer a service call
#[async_trait]
pub trait ServiceHandler: Send + Sync {
    async fn call(&self, data: Value) -> Result<ServiceResponse, ServiceError>;
}

/// Services keyed by domain and name
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    handlers: Arc<RwLock<HashMap<(String, String), Arc<dyn ServiceHandler>>>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn has_service(&self, domain: &str, service: &str) -> bool {
        self.handlers
            .read()
            .await
            .contains_key(&(domain.to_string(), service.to_string()))
    }

    /// Registers a handler, replacing any previous one under the same name
    pub async fn register(&self, domain: &str, service: &str, handler: Arc<dyn ServiceHandler>) {
        info!(domain, service, "Registering service");
        self.handlers
            .write()
            .await
            .insert((domain.to_string(), service.to_string()), handler);
    }

    pub async fn remove(&self, domain: &str, service: &str) -> bool {
        let removed = self
            .handlers
            .write()
            .await
            .remove(&(domain.to_string(), service.to_string()))
            .is_some();
        if removed {
            info!(domain, service, "Removed service");
        }
        removed
    }

    pub async fn services(&self) -> Vec<(String, String)> {
        let mut names: Vec<_> = self.handlers.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Calls a service. The registry lock is released before the handler runs.
    pub async fn call(
        &self,
        domain: &str,
        service: &str,
        data: Value,
    ) -> Result<ServiceResponse, ServiceError> {
        let handler = self
            .handlers
            .read()
            .await
            .get(&(domain.to_string(), service.to_string()))
            .cloned()
            .ok_or_else(|| ServiceError::NotFound {
                domain: domain.to_string(),
                service: service.to_string(),
            })?;
        debug!(domain, service, "Calling service");
        handler.call(data).await
    }
}

/// `send_message`: forwards the message to its agent and fires a response event
pub struct SendMessageHandler {
    agent: Arc<SidecarClient>,
    bus: EventBus,
}

impl SendMessageHandler {
    pub fn new(agent: Arc<SidecarClient>, bus: EventBus) -> Self {
        Self { agent, bus }
    }
}

#[async_trait]
impl ServiceHandler for SendMessageHandler {
    async fn call(&self, data: Value) -> Result<ServiceResponse, ServiceError> {
        let data: SendMessageData =
            serde_json::from_value(data).map_err(|e| ServiceError::InvalidData(e.to_string()))?;

        let result = self.agent.send_message(&data.message).await;
        self.bus
            .publish(ResponseEventData::from_result(&data.message, &result).into_event());
        Ok(result)
    }
}

/// `new_conversation`: takes no data
pub struct NewConversationHandler {
    agent: Arc<SidecarClient>,
}

impl NewConversationHandler {
    pub fn new(agent: Arc<SidecarClient>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl ServiceHandler for NewConversationHandler {
    async fn call(&self, _data: Value) -> Result<ServiceResponse, ServiceError> {
        Ok(self.agent.new_conversation().await)
    }
}
