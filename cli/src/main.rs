use clap::Parser;
use colored::*;
use dotenvy::dotenv;

mod app;
mod bridge_client;
mod cli;
mod logging;
mod output;
mod setup;

use crate::bridge_client::BridgeClient;
use crate::cli::{Args, Command};

/// Local commands edit the config entries directly; the rest talk to the
/// bridge daemon.
#[tokio::main]
async fn main() {
    dotenv().ok();
    let args = Args::parse();
    logging::init(&args.log_level);

    if let Err(e) = run(args).await {
        tracing::error!("{:#}", e);
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config_dir = args.config_dir.as_deref();

    match args.command {
        Command::Setup { url } => {
            let mut store = setup::open_store(config_dir)?;
            setup::run_setup(&mut store, url).await
        }
        Command::Options { entry_id, url } => {
            let mut store = setup::open_store(config_dir)?;
            setup::run_options(&mut store, &entry_id, url)
        }
        Command::Entries => {
            let store = setup::open_store(config_dir)?;
            setup::run_entries(&store);
            Ok(())
        }
        Command::Remove { entry_id, yes } => {
            let mut store = setup::open_store(config_dir)?;
            setup::run_remove(&mut store, &entry_id, yes)
        }
        Command::Status => app::run_status(&connect(&args.daemon_url).await?).await,
        Command::Send { message } => {
            app::run_single_message(message, &connect(&args.daemon_url).await?).await
        }
        Command::New => app::run_new_conversation(&connect(&args.daemon_url).await?).await,
        Command::Chat => app::run_interactive_chat(&connect(&args.daemon_url).await?).await,
        Command::Events => app::run_events(&connect(&args.daemon_url).await?).await,
    }
}

async fn connect(daemon_url: &str) -> anyhow::Result<BridgeClient> {
    let client = BridgeClient::new(daemon_url);
    app::ensure_daemon(&client).await?;
    Ok(client)
}
