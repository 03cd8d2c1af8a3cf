//! Fetch error types.

use thiserror::Error;

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error (connect, timeout, body).
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Domain not allowed.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl HttpError {
    /// Returns true if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request(e) if e.is_timeout())
    }
}

// ============================================================================
// Exchange Error
// ============================================================================

/// Failure of one of the credential-exchange round trips.
///
/// `status` is the HTTP status when the server answered, and `None` for
/// transport failures or unusable response bodies. `detail` is the server's
/// own explanation when it gave one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// The authorize endpoint failed or returned an unusable URL.
    #[error("Authorization request failed{}: {detail}", status_suffix(.status))]
    AuthorizationRequestFailed {
        /// HTTP status, if the server answered.
        status: Option<u16>,
        /// Human-readable detail.
        detail: String,
    },

    /// The credentials endpoint failed.
    #[error("Credential redemption failed{}: {detail}", status_suffix(.status))]
    CredentialRedemptionFailed {
        /// HTTP status, if the server answered.
        status: Option<u16>,
        /// Human-readable detail.
        detail: String,
    },

    /// The data endpoint failed.
    #[error("Loading items failed{}: {detail}", status_suffix(.status))]
    LoadFailed {
        /// HTTP status, if the server answered.
        status: Option<u16>,
        /// Human-readable detail.
        detail: String,
    },
}

impl ExchangeError {
    /// Returns the HTTP status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthorizationRequestFailed { status, .. }
            | Self::CredentialRedemptionFailed { status, .. }
            | Self::LoadFailed { status, .. } => *status,
        }
    }

    /// Returns the human-readable detail.
    pub fn detail(&self) -> &str {
        match self {
            Self::AuthorizationRequestFailed { detail, .. }
            | Self::CredentialRedemptionFailed { detail, .. }
            | Self::LoadFailed { detail, .. } => detail,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}
