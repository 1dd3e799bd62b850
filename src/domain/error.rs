//! Error types for the access gate.

use thiserror::Error;

/// Top-level application error
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Blockchain error: {0}")]
    Blockchain(#[from] BlockchainError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not supported: {0}")]
    NotSupported(String),
}

impl AppError {
    /// Whether retrying the same call later could plausibly succeed.
    ///
    /// Only ledger connectivity and service failures qualify; a response we
    /// could not make sense of will not improve on retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Blockchain(err) => err.is_transient(),
            _ => false,
        }
    }
}

/// Ledger (Solana RPC) errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BlockchainError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl BlockchainError {
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BlockchainError::Connection(_) | BlockchainError::Timeout(_) | BlockchainError::RpcError(_)
        )
    }
}

/// Configuration errors, raised at startup
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Request validation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("{0}")]
    Multiple(String),
}
