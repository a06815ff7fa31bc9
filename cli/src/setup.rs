use anyhow::{bail, Context, Result};
use chatgpt_plus_core::config_flow::ERROR_BASE;
use chatgpt_plus_core::{
    ConfigFlow, ConfigStore, FlowResult, OptionsFlow, Timeouts, UserInput, ENTRIES_FILE,
};
use colored::*;
use dialoguer::{Confirm, Input};
use std::path::Path;
use tracing::info;

use crate::output::{print_entries, setup_error_label};

pub fn open_store(config_dir: Option<&Path>) -> Result<ConfigStore> {
    let store = match config_dir {
        Some(dir) => ConfigStore::open(dir.join(ENTRIES_FILE)),
        None => ConfigStore::open_default(),
    };
    store.context("Failed to open config entries")
}

fn prompt_url(default: &str) -> Result<String> {
    Input::new()
        .with_prompt("Sidecar URL")
        .default(default.to_string())
        .interact_text()
        .context("Failed to read sidecar URL")
}

/// Setup flow. Without `url` the user is prompted, and prompted again after
/// a validation error.
pub async fn run_setup(store: &mut ConfigStore, url: Option<String>) -> Result<()> {
    let client = reqwest::Client::new();
    let interactive = url.is_none();
    let mut flow = ConfigFlow::new(&client, store, Timeouts::default());

    let mut next = match url {
        Some(url) => UserInput { sidecar_url: url },
        None => match flow.step_user(None).await? {
            FlowResult::ShowForm {
                default_sidecar_url,
                ..
            } => UserInput {
                sidecar_url: prompt_url(&default_sidecar_url)?,
            },
            other => bail!("Unexpected setup step: {:?}", other),
        },
    };

    loop {
        println!("Checking sidecar at {}...", next.sidecar_url);
        match flow.step_user(Some(next)).await? {
            FlowResult::CreateEntry(entry) => {
                info!(entry_id = %entry.entry_id, "Created config entry");
                println!("{} {}", "Created entry".green().bold(), entry.entry_id);
                println!("Restart the bridge daemon to load it.");
                return Ok(());
            }
            FlowResult::Abort { reason } => {
                println!("{} ({})", "This sidecar is already configured.".yellow(), reason);
                return Ok(());
            }
            FlowResult::ShowForm {
                default_sidecar_url,
                errors,
                ..
            } => {
                let code = errors.get(ERROR_BASE).map(String::as_str).unwrap_or("unknown");
                eprintln!("{} {}", "Error:".red().bold(), setup_error_label(code));
                if !interactive {
                    bail!("Setup failed: {}", code);
                }
                next = UserInput {
                    sidecar_url: prompt_url(&default_sidecar_url)?,
                };
            }
        }
    }
}

pub fn run_options(store: &mut ConfigStore, entry_id: &str, url: Option<String>) -> Result<()> {
    let mut flow = OptionsFlow::new(store);

    let sidecar_url = match url {
        Some(url) => url,
        None => match flow.step_init(entry_id, None)? {
            FlowResult::ShowForm {
                default_sidecar_url,
                ..
            } => prompt_url(&default_sidecar_url)?,
            other => bail!("Unexpected options step: {:?}", other),
        },
    };

    match flow.step_init(entry_id, Some(UserInput { sidecar_url }))? {
        FlowResult::CreateEntry(entry) => {
            println!(
                "{} {} now uses {}",
                "Updated".green().bold(),
                entry.entry_id,
                entry.sidecar_url()
            );
            println!("Restart the bridge daemon to apply it.");
            Ok(())
        }
        other => bail!("Unexpected options step: {:?}", other),
    }
}

pub fn run_entries(store: &ConfigStore) {
    print_entries(store.entries());
}

pub fn run_remove(store: &mut ConfigStore, entry_id: &str, yes: bool) -> Result<()> {
    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove entry {}?", entry_id))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let entry = store.remove(entry_id)?;
    println!("{} {} ({})", "Removed".green().bold(), entry.entry_id, entry.sidecar_url());
    Ok(())
}
