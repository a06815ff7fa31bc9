use reqwest::Client;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::config::{
    unique_id_for, ConfigEntry, ConfigStore, EntryOptions, Timeouts, DEFAULT_SIDECAR_URL,
};
use crate::endpoint::normalize_url;
use crate::errors::ConfigResult;
use crate::validator::validate_connection;

/// Form field holding the sidecar URL
pub const CONF_SIDECAR_URL: &str = "sidecar_url";

/// Key under which form-wide errors are reported
pub const ERROR_BASE: &str = "base";

/// Abort reason when the sidecar already has an entry
pub const ABORT_ALREADY_CONFIGURED: &str = "already_configured";

/// What the user submitted in a setup or options form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInput {
    pub sidecar_url: String,
}

/// Next step of a flow
#[derive(Debug, Clone, PartialEq)]
pub enum FlowResult {
    /// Show (or re-show) the form, with any errors keyed by field
    ShowForm {
        step_id: &'static str,
        default_sidecar_url: String,
        errors: HashMap<String, String>,
    },
    /// The flow finished and stored this entry
    CreateEntry(ConfigEntry),
    Abort { reason: &'static str },
}

/// Setup flow: validates a sidecar URL and creates a config entry for it
pub struct ConfigFlow<'a> {
    client: &'a Client,
    store: &'a mut ConfigStore,
    timeouts: Timeouts,
}

impl<'a> ConfigFlow<'a> {
    pub fn new(client: &'a Client, store: &'a mut ConfigStore, timeouts: Timeouts) -> Self {
        Self {
            client,
            store,
            timeouts,
        }
    }

    /// Handle the initial step. `None` asks for the form.
    pub async fn step_user(&mut self, input: Option<UserInput>) -> ConfigResult<FlowResult> {
        let Some(input) = input else {
            return Ok(Self::user_form(DEFAULT_SIDECAR_URL.to_string(), HashMap::new()));
        };

        let sidecar_url = normalize_url(&input.sidecar_url);
        if let Err(e) = validate_connection(self.client, &sidecar_url, &self.timeouts).await {
            warn!(sidecar_url = %sidecar_url, code = e.code(), error = %e, "Sidecar validation failed");
            let errors = HashMap::from([(ERROR_BASE.to_string(), e.code().to_string())]);
            return Ok(Self::user_form(sidecar_url, errors));
        }

        if self.store.find_by_unique_id(&unique_id_for(&sidecar_url)).is_some() {
            info!(sidecar_url = %sidecar_url, "Sidecar is already configured");
            return Ok(FlowResult::Abort {
                reason: ABORT_ALREADY_CONFIGURED,
            });
        }

        let entry = ConfigEntry::new(&sidecar_url);
        self.store.add(entry.clone())?;
        Ok(FlowResult::CreateEntry(entry))
    }

    fn user_form(default_sidecar_url: String, errors: HashMap<String, String>) -> FlowResult {
        FlowResult::ShowForm {
            step_id: "user",
            default_sidecar_url,
            errors,
        }
    }
}

/// Options flow: lets the user point an existing entry at another URL.
/// The new URL is stored as-is without probing the sidecar.
pub struct OptionsFlow<'a> {
    store: &'a mut ConfigStore,
}

impl<'a> OptionsFlow<'a> {
    pub fn new(store: &'a mut ConfigStore) -> Self {
        Self { store }
    }

    /// Manage the options. `None` asks for the form.
    pub fn step_init(
        &mut self,
        entry_id: &str,
        input: Option<UserInput>,
    ) -> ConfigResult<FlowResult> {
        match input {
            None => {
                let current = self
                    .store
                    .get(entry_id)
                    .map(|e| e.sidecar_url().to_string())
                    .unwrap_or_else(|| DEFAULT_SIDECAR_URL.to_string());
                Ok(FlowResult::ShowForm {
                    step_id: "init",
                    default_sidecar_url: current,
                    errors: HashMap::new(),
                })
            }
            Some(input) => {
                let options = EntryOptions {
                    sidecar_url: Some(normalize_url(&input.sidecar_url)),
                };
                let entry = self.store.update_options(entry_id, options)?;
                Ok(FlowResult::CreateEntry(entry))
            }
        }
    }
}
