//! Error types for hashlink

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The hash primitive could not complete. Only observed inside the
    /// digest retry loop; never returned from the public chain API.
    #[error("Hash computation failed: {0}")]
    HashFailure(String),
    #[error("Invalid block linkage at height {height}")]
    InvalidBlockLinkage { height: usize },
    #[error("Invalid proof of work at height {height}")]
    InvalidProofOfWork { height: usize },
    #[error("Invalid block: {0}")]
    InvalidBlock(String),
    #[error("Mining cancelled before a valid nonce was found")]
    MiningCancelled,
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::SerializationError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
