//! Error types for LedgerBridge

use thiserror::Error;

/// Every failure the repository layer can surface to a caller.
///
/// A cache miss is not represented here; lookups that can miss return `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Format error: {0}")]
    Format(String),
    #[error("Length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("RPC error: {0}")]
    Rpc(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for RepositoryError {
    fn from(err: std::io::Error) -> Self {
        RepositoryError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Encoding(err.to_string())
    }
}

impl From<toml::de::Error> for RepositoryError {
    fn from(err: toml::de::Error) -> Self {
        RepositoryError::Config(err.to_string())
    }
}

impl From<reqwest::Error> for RepositoryError {
    fn from(err: reqwest::Error) -> Self {
        RepositoryError::Rpc(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, RepositoryError>;
