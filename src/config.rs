//! Configuration management for LedgerBridge

use crate::error::{RepositoryError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// File read by [`load_config`] from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_url")]
    pub url: String,
    /// Prefix of every remote method name, e.g. `ftm` for `ftm_getTransactionByHash`.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Per-request deadline enforced by the transport. No deadline when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            namespace: default_namespace(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber` filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:18545".to_string()
}

fn default_namespace() -> String {
    "ftm".to_string()
}

fn default_cache_capacity() -> usize {
    10_000
}

fn default_log_filter() -> String {
    "info".to_string()
}

/// Loads `config.toml` from the working directory, or defaults when the file is absent.
pub fn load_config() -> Result<Config> {
    if Path::new(DEFAULT_CONFIG_FILE).exists() {
        load_config_from(DEFAULT_CONFIG_FILE)
    } else {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }
}

/// Loads and validates an explicit configuration file.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config> {
    let config_str = fs::read_to_string(path.as_ref())?;
    parse_config(&config_str)
}

/// Parses and validates configuration text.
pub fn parse_config(config_str: &str) -> Result<Config> {
    let config: Config = toml::from_str(config_str)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !(self.rpc.url.starts_with("http://") || self.rpc.url.starts_with("https://")) {
            return Err(RepositoryError::Config(format!(
                "rpc.url must be an http(s) endpoint, got {:?}",
                self.rpc.url
            )));
        }

        if self.rpc.namespace.is_empty() || !self.rpc.namespace.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(RepositoryError::Config(format!(
                "rpc.namespace must be a non-empty alphanumeric prefix, got {:?}",
                self.rpc.namespace
            )));
        }

        if self.cache.capacity == 0 {
            return Err(RepositoryError::Config("cache.capacity must be greater than zero".to_string()));
        }

        Ok(())
    }
}
