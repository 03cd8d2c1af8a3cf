//! Store error types.

use thiserror::Error;

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Unknown settings key.
    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    /// A settings value could not be parsed.
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue {
        /// Settings key.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl StoreError {
    /// Returns true if the error came from reading or writing a file.
    pub fn is_io(&self) -> bool {
        matches!(self, StoreError::Io(_))
    }

    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        StoreError::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
