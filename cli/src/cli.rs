use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_DAEMON_URL: &str = "http://127.0.0.1:8123";

/// Command line client for the ChatGPT Plus bridge
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Base URL of the bridge daemon
    #[arg(long, global = true, env = "CHATGPT_PLUS_DAEMON_URL", default_value = DEFAULT_DAEMON_URL)]
    pub daemon_url: String,

    /// Directory holding the config entries, shared with the daemon
    #[arg(long, global = true, env = "CHATGPT_PLUS_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, env = "CHATGPT_PLUS_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a sidecar and add a config entry for it
    Setup {
        /// Sidecar URL, prompted for when omitted
        #[arg(long)]
        url: Option<String>,
    },
    /// Point an existing entry at another sidecar URL
    Options {
        entry_id: String,
        /// New sidecar URL, prompted for when omitted
        #[arg(long)]
        url: Option<String>,
    },
    /// List config entries
    Entries,
    /// Remove a config entry
    Remove {
        entry_id: String,
        /// Do not ask for confirmation
        #[arg(short, long, default_value_t = false)]
        yes: bool,
    },
    /// Show the sidecar status
    Status,
    /// Send one message to ChatGPT
    Send { message: String },
    /// Start a new conversation
    New,
    /// Interactive chat session
    Chat,
    /// Print events fired by the daemon
    Events,
}
