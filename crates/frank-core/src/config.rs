//! Persistent configuration for frank clients.
//!
//! Stores the default agent coordinates in `~/.frank/config.json` so that
//! command-line tools and test programs can share them.
//!
//! # Example
//!
//! ```no_run
//! use frank_core::config::FrankConfig;
//! use frank_core::device::Device;
//!
//! // Load (returns defaults if the file doesn't exist)
//! let config = FrankConfig::load();
//! let device = Device::from_config(&config);
//! println!("Talking to {}", device.uri());
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

const CONFIG_FILENAME: &str = "config.json";

/// Port the Frank agent listens on unless the app was built otherwise.
pub const DEFAULT_PORT: u16 = 37265;

/// Returns `~/.frank`, or `None` if the home directory cannot be determined.
pub fn frank_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".frank"))
}

/// Persistent frank configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrankConfig {
    /// Hostname or IP address of the device running the agent.
    pub host: String,
    /// Port the agent listens on.
    pub port: u16,
    /// Cosmetic device name used in logs.
    pub name: String,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for FrankConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            name: "iPhone".to_string(),
            timeout_secs: 15,
        }
    }
}

impl FrankConfig {
    /// Location of the config file, `~/.frank/config.json`.
    pub fn path() -> Option<PathBuf> {
        frank_dir().map(|dir| dir.join(CONFIG_FILENAME))
    }

    /// Load config from `~/.frank/config.json`.
    ///
    /// Returns [`Default`] if the file does not exist or cannot be parsed.
    pub fn load() -> Self {
        Self::path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load config from `path`, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to `~/.frank/config.json`, creating the directory if needed.
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::path().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "could not determine home directory")
        })?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
