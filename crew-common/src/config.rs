//! Configuration loading for the roster hub
//!
//! Resolution follows the priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or partial config file never prevents startup; absent fields
//! fall back to compiled defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming the config file location
pub const CONFIG_ENV_VAR: &str = "CLASSCREW_CONFIG";
/// Environment variable overriding the database path
pub const DATABASE_ENV_VAR: &str = "CLASSCREW_DATABASE";

/// Hub service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// SQLite document store location
    pub database_path: PathBuf,
    /// EventBus channel capacity
    pub event_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5780,
            database_path: default_database_path(),
            event_capacity: 256,
        }
    }
}

impl HubConfig {
    /// Load configuration, applying the priority order above.
    ///
    /// `cli_config` is an explicit config file path (errors if unreadable);
    /// otherwise `CLASSCREW_CONFIG`, then the platform config directory are
    /// tried, and a missing file simply yields defaults.
    pub fn load(cli_config: Option<&Path>) -> Result<Self> {
        if let Some(path) = cli_config {
            return Self::from_file(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::from_file(Path::new(&path));
        }

        if let Some(path) = default_config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
            debug!("No config file at {}, using defaults", path.display());
        }

        Ok(Self::default())
    }

    /// Parse a TOML config file. Unknown keys are ignored; missing keys take
    /// compiled defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: HubConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply command-line and environment overrides on top of file values.
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
        database: Option<PathBuf>,
    ) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        // Priority: cli arg > env var > config file value
        if let Some(database) = database {
            self.database_path = database;
        } else if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
            self.database_path = PathBuf::from(path);
        }
        self
    }

    /// Socket address string for the HTTP listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Ensure the database's parent directory exists.
    pub fn ensure_data_dir(&self) -> Result<()> {
        if let Some(parent) = self.database_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Config(format!("cannot create {}: {}", parent.display(), e))
                })?;
            }
        }
        Ok(())
    }
}

/// Default config file location for the platform
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("classcrew").join("config.toml"))
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    match dirs::data_local_dir() {
        Some(d) => d.join("classcrew").join("classcrew.db"),
        None => {
            warn!("No platform data directory, using ./classcrew.db");
            PathBuf::from("./classcrew.db")
        }
    }
}
