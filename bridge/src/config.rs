use chatgpt_plus_core::{get_default_config_dir, get_default_entries_file, ConfigError, Timeouts};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the daemon config inside the config directory
pub const CONFIG_FILE: &str = "bridge.toml";

#[derive(Error, Debug)]
pub enum BridgeConfigError {
    #[error(transparent)]
    Core(#[from] ConfigError),
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8123)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Events a slow subscriber may fall behind before it starts missing some
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

/// Daemon configuration, read from `bridge.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub server: ServerConfig,
    pub events: EventsConfig,
    pub timeouts: Timeouts,
    /// Config entry store, defaults to `entries.toml` next to this file
    pub entries_file: Option<PathBuf>,
}

impl BridgeConfig {
    /// Loads configuration from a file if it exists, otherwise returns the default config
    pub fn load_from_file(path: &Path) -> Result<Self, BridgeConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| BridgeConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| BridgeConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `bridge.toml` from the default config directory
    pub fn load_from_default() -> Result<Self, BridgeConfigError> {
        Self::load_from_file(&default_config_file()?)
    }

    pub fn entries_file(&self) -> Result<PathBuf, BridgeConfigError> {
        match &self.entries_file {
            Some(path) => Ok(path.clone()),
            None => Ok(get_default_entries_file()?),
        }
    }
}

pub fn default_config_file() -> Result<PathBuf, BridgeConfigError> {
    Ok(get_default_config_dir()?.join(CONFIG_FILE))
}
