use anyhow::Context;
use chatgpt_plus_bridge::config::{BridgeConfig, CONFIG_FILE};
use chatgpt_plus_bridge::events::EventBus;
use chatgpt_plus_bridge::http_server;
use chatgpt_plus_bridge::integration::Integration;
use chatgpt_plus_bridge::services::ServiceRegistry;
use chatgpt_plus_core::{ConfigStore, ENTRIES_FILE};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "bridge-daemon",
    about = "Exposes ChatGPT Plus sidecars as send_message/new_conversation services"
)]
struct Args {
    /// Path to config file
    #[arg(short, long, env = "CHATGPT_PLUS_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding bridge.toml and entries.toml
    #[arg(long, env = "CHATGPT_PLUS_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// HTTP listen address, overrides the config file
    #[arg(short, long, env = "CHATGPT_PLUS_LISTEN")]
    listen: Option<SocketAddr>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "CHATGPT_PLUS_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)))
        .init();

    info!("Starting ChatGPT Plus bridge daemon");

    let config_path = args
        .config
        .clone()
        .or_else(|| args.config_dir.as_ref().map(|dir| dir.join(CONFIG_FILE)));
    let mut config = match &config_path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            BridgeConfig::load_from_file(path)
        }
        None => BridgeConfig::load_from_default(),
    }
    .context("Failed to load configuration")?;

    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }
    if config.entries_file.is_none() {
        if let Some(dir) = &args.config_dir {
            config.entries_file = Some(dir.join(ENTRIES_FILE));
        }
    }

    let entries_file = config.entries_file()?;
    let store = ConfigStore::open(&entries_file)
        .with_context(|| format!("Failed to open config entries at {}", entries_file.display()))?;

    let integration = Arc::new(Integration::new(
        reqwest::Client::new(),
        config.timeouts,
        ServiceRegistry::new(),
        EventBus::new(config.events.capacity),
    ));

    if store.entries().is_empty() {
        warn!(
            "No config entries in {}, run `chatgpt-plus setup` first",
            entries_file.display()
        );
    }
    for entry in store.entries() {
        integration.setup_entry(entry).await;
    }

    http_server::run_server(integration, config.server.listen_addr).await
}
