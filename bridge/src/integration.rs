use chatgpt_plus_core::{ConfigEntry, SidecarClient, Timeouts, DOMAIN};
use chatgpt_plus_ipc::service_messages::{SERVICE_NEW_CONVERSATION, SERVICE_SEND_MESSAGE};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::events::EventBus;
use crate::services::{NewConversationHandler, SendMessageHandler, ServiceRegistry};

/// A set up config entry and its agent
#[derive(Debug, Clone)]
pub struct LoadedEntry {
    pub entry_id: String,
    pub sidecar_url: String,
    pub agent: Arc<SidecarClient>,
}

#[derive(Default)]
struct IntegrationState {
    entries: Vec<LoadedEntry>,
    /// Entry whose agent the registered services are bound to
    services_entry: Option<String>,
}

/// Owns one agent per loaded config entry and keeps the integration's
/// services bound to exactly one of them.
pub struct Integration {
    client: reqwest::Client,
    timeouts: Timeouts,
    services: ServiceRegistry,
    bus: EventBus,
    state: Mutex<IntegrationState>,
}

impl Integration {
    /// `client` is the shared connection pool every agent reuses
    pub fn new(
        client: reqwest::Client,
        timeouts: Timeouts,
        services: ServiceRegistry,
        bus: EventBus,
    ) -> Self {
        Self {
            client,
            timeouts,
            services,
            bus,
            state: Mutex::new(IntegrationState::default()),
        }
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Set up an entry: create its agent and register the services if no
    /// other entry has done so yet. Setting up a loaded entry again replaces
    /// its agent.
    pub async fn setup_entry(&self, entry: &ConfigEntry) -> Arc<SidecarClient> {
        let mut state = self.state.lock().await;

        if state.entries.iter().any(|e| e.entry_id == entry.entry_id) {
            warn!(entry_id = %entry.entry_id, "Entry already set up, reloading");
            self.unload_locked(&mut state, &entry.entry_id).await;
        }

        let sidecar_url = entry.sidecar_url().to_string();
        let agent = Arc::new(SidecarClient::new(
            self.client.clone(),
            &sidecar_url,
            self.timeouts,
        ));
        state.entries.push(LoadedEntry {
            entry_id: entry.entry_id.clone(),
            sidecar_url: sidecar_url.clone(),
            agent: agent.clone(),
        });

        if state.services_entry.is_none() {
            self.register_services(agent.clone()).await;
            state.services_entry = Some(entry.entry_id.clone());
        }

        info!(entry_id = %entry.entry_id, sidecar_url = %sidecar_url, "ChatGPT Plus HA integration set up successfully");
        agent
    }

    /// Unload an entry. If the services were bound to it they move to the
    /// next loaded entry, or are removed when none is left.
    pub async fn unload_entry(&self, entry_id: &str) -> bool {
        let mut state = self.state.lock().await;
        self.unload_locked(&mut state, entry_id).await
    }

    async fn unload_locked(&self, state: &mut IntegrationState, entry_id: &str) -> bool {
        let Some(index) = state.entries.iter().position(|e| e.entry_id == entry_id) else {
            return false;
        };
        state.entries.remove(index);
        info!(entry_id, "Unloaded entry");

        if state.services_entry.as_deref() == Some(entry_id) {
            state.services_entry = None;
            match state.entries.first() {
                Some(next) => {
                    info!(entry_id = %next.entry_id, "Rebinding services");
                    self.register_services(next.agent.clone()).await;
                    state.services_entry = Some(next.entry_id.clone());
                }
                None => {
                    self.services.remove(DOMAIN, SERVICE_SEND_MESSAGE).await;
                    self.services.remove(DOMAIN, SERVICE_NEW_CONVERSATION).await;
                }
            }
        }
        true
    }

    async fn register_services(&self, agent: Arc<SidecarClient>) {
        self.services
            .register(
                DOMAIN,
                SERVICE_SEND_MESSAGE,
                Arc::new(SendMessageHandler::new(agent.clone(), self.bus.clone())),
            )
            .await;
        self.services
            .register(
                DOMAIN,
                SERVICE_NEW_CONVERSATION,
                Arc::new(NewConversationHandler::new(agent)),
            )
            .await;
    }

    pub async fn agent(&self, entry_id: &str) -> Option<Arc<SidecarClient>> {
        let state = self.state.lock().await;
        state
            .entries
            .iter()
            .find(|e| e.entry_id == entry_id)
            .map(|e| e.agent.clone())
    }

    /// The agent the services are currently bound to
    pub async fn primary_agent(&self) -> Option<Arc<SidecarClient>> {
        let state = self.state.lock().await;
        let entry_id = state.services_entry.as_deref()?;
        state
            .entries
            .iter()
            .find(|e| e.entry_id == entry_id)
            .map(|e| e.agent.clone())
    }

    pub async fn loaded_entries(&self) -> Vec<LoadedEntry> {
        self.state.lock().await.entries.clone()
    }
}
