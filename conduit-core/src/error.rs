//! Core error types for Conduit.

use thiserror::Error;

/// Core error type for Conduit operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Provider identifier is not registered.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data from a server response.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
