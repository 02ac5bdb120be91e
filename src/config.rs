//! Configuration management with validation and defaults.

use crate::errors::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level service configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FairbetConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub game: GameConfig,
}

/// HTTP server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

/// Ledger store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_directory: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_directory: "./data/ledger".to_string(),
        }
    }
}

/// Settlement limits. Amounts are integer cents.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub min_bet: u64,
    pub max_bet: u64,
    /// Attempts for the whole settlement unit on lock conflicts.
    pub max_settle_retries: u32,
    pub retry_backoff_ms: u64,
    pub max_client_seed_len: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_bet: 1,
            max_bet: 10_000_000, // $100,000.00
            max_settle_retries: 3,
            retry_backoff_ms: 25,
            max_client_seed_len: 64,
        }
    }
}

impl FairbetConfig {
    /// Load a TOML config file. Missing keys fall back to defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            CoreError::Validation(format!(
                "Failed to read config {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let config: FairbetConfig = toml::from_str(&raw)
            .map_err(|e| CoreError::Validation(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.server.host.parse::<std::net::IpAddr>().is_err() {
            return Err(CoreError::Validation(format!(
                "server.host is not an IP address: {}",
                self.server.host
            )));
        }
        if self.game.min_bet == 0 {
            return Err(CoreError::Validation(
                "game.min_bet must be at least 1 cent".to_string(),
            ));
        }
        if self.game.max_bet < self.game.min_bet {
            return Err(CoreError::Validation(
                "game.max_bet must be >= game.min_bet".to_string(),
            ));
        }
        if self.game.max_settle_retries == 0 {
            return Err(CoreError::Validation(
                "game.max_settle_retries must be at least 1".to_string(),
            ));
        }
        if self.storage.data_directory.is_empty() {
            return Err(CoreError::Validation(
                "storage.data_directory must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
