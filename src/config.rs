//! Configuration management for AeroChain

use crate::error::LedgerError;
use crate::persistence::DEFAULT_LEDGER_KEY;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    File,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    /// SQLite database file, or directory for the file backend.
    #[serde(default = "default_storage_path")]
    pub path: String,
    #[serde(default = "default_key")]
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_storage_path(),
            key: default_key(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: default_api_port(),
        }
    }
}

fn default_backend() -> StorageBackend {
    StorageBackend::Sqlite
}

fn default_storage_path() -> String {
    "./data/aerochain.db".to_string()
}

fn default_key() -> String {
    DEFAULT_LEDGER_KEY.to_string()
}

fn default_api_port() -> u16 {
    3000
}

/// Load `config.toml` (or the file named by `AEROCHAIN_CONFIG`), falling back
/// to defaults when it does not exist. `PORT` overrides `api.port`.
pub fn load_config() -> Result<Config, LedgerError> {
    let path = std::env::var("AEROCHAIN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = load_config_from(Path::new(&path))?;

    if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
        config.api.port = port;
    }

    Ok(config)
}

pub fn load_config_from(path: &Path) -> Result<Config, LedgerError> {
    let config_str = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(LedgerError::Config(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };

    let config: Config = if config_str.trim().is_empty() {
        Config::default()
    } else {
        toml::from_str(&config_str)?
    };

    config.validate()?;
    Ok(config)
}

impl Config {
    fn validate(&self) -> Result<(), LedgerError> {
        if self.storage.backend != StorageBackend::Memory && self.storage.path.is_empty() {
            return Err(LedgerError::Config("storage.path must be set".to_string()));
        }
        if self.storage.key.is_empty() {
            return Err(LedgerError::Config("storage.key must not be empty".to_string()));
        }
        Ok(())
    }
}
