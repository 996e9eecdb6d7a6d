//! Rider client configuration.
//!
//! Persists the backend URL and purchase API key to `~/.aett/config.json`.
//! Flags and environment variables override the file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Persistent rider configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RiderConfig {
    /// Backend base URL (e.g., "<http://localhost:8000>").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_url: Option<String>,
    /// Static API key sent on purchase requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl RiderConfig {
    /// Path to the config directory: `~/.aett/`.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".aett"))
    }

    /// Path to the config file: `~/.aett/config.json`.
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.json"))
    }

    /// Load config from disk. Returns default if file doesn't exist or is
    /// invalid.
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let dir =
            Self::config_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("config.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
