//! Configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Client configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Ethereum private key for signing orders (hex, with or without 0x prefix)
    pub private_key: String,
    /// CLOB API base URL
    pub clob_url: String,
    /// Gamma API base URL for market discovery
    pub gamma_url: String,
    /// Chain ID (137 for Polygon mainnet, 80002 for Amoy testnet)
    pub chain_id: u64,
    /// Simulate orders instead of submitting them
    pub dry_run: bool,
    /// Whether market-data caching is enabled
    pub cache_enabled: bool,
    /// Cache TTL for market data in seconds
    pub cache_ttl_secs: u64,
    /// Log level
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let private_key = env::var("PMCLIENT_PRIVATE_KEY")
            .or_else(|_| env::var("PK"))
            .map_err(|_| ConfigError::MissingVar("PMCLIENT_PRIVATE_KEY or PK"))?;

        let clob_url = env::var("PMCLIENT_CLOB_URL")
            .unwrap_or_else(|_| "https://clob.polymarket.com".to_string());

        let gamma_url = env::var("PMCLIENT_GAMMA_URL")
            .unwrap_or_else(|_| "https://gamma-api.polymarket.com".to_string());

        let chain_id = env::var("PMCLIENT_CHAIN_ID")
            .unwrap_or_else(|_| "137".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PMCLIENT_CHAIN_ID"))?;

        // Default to dry run so a fresh environment never submits real orders.
        let dry_run = env::var("PMCLIENT_DRY_RUN")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let cache_enabled = env::var("PMCLIENT_CACHE_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let cache_ttl_secs = env::var("PMCLIENT_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PMCLIENT_CACHE_TTL_SECS"))?;

        let log_level = env::var("PMCLIENT_LOG_LEVEL")
            .or_else(|_| env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            private_key,
            clob_url,
            gamma_url,
            chain_id,
            dry_run,
            cache_enabled,
            cache_ttl_secs,
            log_level,
        })
    }

    /// Validate and normalize the loaded configuration.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if !self.private_key.starts_with("0x") {
            self.private_key = format!("0x{}", self.private_key);
        }
        if self.private_key.len() != 66 {
            return Err(ConfigError::InvalidValue("private key length"));
        }
        if self.chain_id != 137 && self.chain_id != 80002 {
            return Err(ConfigError::InvalidValue("PMCLIENT_CHAIN_ID"));
        }
        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue("PMCLIENT_CACHE_TTL_SECS"));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Normalize private key (strip 0x prefix) into raw bytes.
    pub fn private_key_bytes(&self) -> Result<[u8; 32], ConfigError> {
        let key = self.private_key.strip_prefix("0x").unwrap_or(&self.private_key);
        let bytes = hex::decode(key).map_err(|_| ConfigError::InvalidValue("private key format"))?;
        bytes
            .try_into()
            .map_err(|_| ConfigError::InvalidValue("private key length"))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid value for: {0}")]
    InvalidValue(&'static str),
}
