use crate::endpoint::normalize_url;
use crate::errors::{ConfigError, ConfigResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// Integration domain, used for service names, events and unique ids
pub const DOMAIN: &str = "chatgpt_plus_ha";

/// Sidecar URL offered when nothing else is configured
pub const DEFAULT_SIDECAR_URL: &str = "http://localhost:3000";

/// Title given to every created config entry
pub const ENTRY_TITLE: &str = "ChatGPT Plus HA";

/// Version of the config entry layout
pub const CONFIG_VERSION: u32 = 1;

const APP_NAME: &str = "chatgpt-plus";
/// File name of the config entry store inside the config directory
pub const ENTRIES_FILE: &str = "entries.toml";

/// Per-request timeouts for the sidecar API, stored as whole seconds in TOML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    #[serde(with = "duration_secs")]
    pub health: Duration,
    #[serde(with = "duration_secs")]
    pub status: Duration,
    /// Chat replies can take minutes
    #[serde(with = "duration_secs")]
    pub chat: Duration,
    #[serde(with = "duration_secs")]
    pub new_conversation: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            health: Duration::from_secs(10),
            status: Duration::from_secs(10),
            chat: Duration::from_secs(180),
            new_conversation: Duration::from_secs(30),
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Data collected by the setup flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryData {
    pub sidecar_url: String,
}

/// Data collected by the options flow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidecar_url: Option<String>,
}

/// One configured sidecar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub entry_id: String,
    pub unique_id: String,
    pub title: String,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub data: EntryData,
    #[serde(default)]
    pub options: EntryOptions,
}

impl ConfigEntry {
    /// Creates a new entry for an already validated sidecar URL
    pub fn new(sidecar_url: &str) -> Self {
        let sidecar_url = normalize_url(sidecar_url);
        Self {
            entry_id: Uuid::new_v4().simple().to_string(),
            unique_id: unique_id_for(&sidecar_url),
            title: ENTRY_TITLE.to_string(),
            version: CONFIG_VERSION,
            created_at: Utc::now(),
            data: EntryData { sidecar_url },
            options: EntryOptions::default(),
        }
    }

    /// URL the agent should use: the options override if one was saved
    pub fn sidecar_url(&self) -> &str {
        self.options
            .sidecar_url
            .as_deref()
            .unwrap_or(&self.data.sidecar_url)
    }
}

/// Unique id guarding against configuring the same sidecar twice
pub fn unique_id_for(sidecar_url: &str) -> String {
    format!("{}_{}", DOMAIN, normalize_url(sidecar_url))
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct EntriesFile {
    #[serde(default)]
    entries: Vec<ConfigEntry>,
}

/// Config entries persisted as a TOML file
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    entries: Vec<ConfigEntry>,
}

impl ConfigStore {
    /// Opens the store at `path`; a missing or empty file means no entries
    pub fn open(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let path = path.into();
        let entries = Self::load_entries(&path)?;
        debug!(path = %path.display(), count = entries.len(), "Loaded config entries");
        Ok(Self { path, entries })
    }

    /// Opens the store in the default config directory
    pub fn open_default() -> ConfigResult<Self> {
        Self::open(get_default_entries_file()?)
    }

    fn load_entries(path: &Path) -> ConfigResult<Vec<ConfigEntry>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let file: EntriesFile = toml::from_str(&content)?;
        Ok(file.entries)
    }

    fn save(&self) -> ConfigResult<()> {
        let file = EntriesFile {
            entries: self.entries.clone(),
        };
        let content = toml::to_string(&file)?;

        // Ensure the directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    pub fn get(&self, entry_id: &str) -> Option<&ConfigEntry> {
        self.entries.iter().find(|e| e.entry_id == entry_id)
    }

    pub fn find_by_unique_id(&self, unique_id: &str) -> Option<&ConfigEntry> {
        self.entries.iter().find(|e| e.unique_id == unique_id)
    }

    /// Adds an entry and writes the file
    pub fn add(&mut self, entry: ConfigEntry) -> ConfigResult<()> {
        info!(entry_id = %entry.entry_id, unique_id = %entry.unique_id, "Adding config entry");
        self.entries.push(entry);
        self.save()
    }

    /// Removes an entry and writes the file
    pub fn remove(&mut self, entry_id: &str) -> ConfigResult<ConfigEntry> {
        let index = self
            .entries
            .iter()
            .position(|e| e.entry_id == entry_id)
            .ok_or_else(|| ConfigError::EntryNotFound(entry_id.to_string()))?;
        let entry = self.entries.remove(index);
        self.save()?;
        info!(entry_id, "Removed config entry");
        Ok(entry)
    }

    /// Replaces an entry's options and writes the file
    pub fn update_options(
        &mut self,
        entry_id: &str,
        options: EntryOptions,
    ) -> ConfigResult<ConfigEntry> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.entry_id == entry_id)
            .ok_or_else(|| ConfigError::EntryNotFound(entry_id.to_string()))?;
        entry.options = options;
        let updated = entry.clone();
        self.save()?;
        info!(entry_id, sidecar_url = %updated.sidecar_url(), "Updated config entry options");
        Ok(updated)
    }
}

/// Default config directory: `$CHATGPT_PLUS_CONFIG_DIR`, else `<config dir>/chatgpt-plus`
pub fn get_default_config_dir() -> ConfigResult<PathBuf> {
    if let Ok(dir) = std::env::var("CHATGPT_PLUS_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(config_dir.join(APP_NAME))
}

/// Default path of the config entry store
pub fn get_default_entries_file() -> ConfigResult<PathBuf> {
    Ok(get_default_config_dir()?.join(ENTRIES_FILE))
}
