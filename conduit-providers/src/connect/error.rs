//! Connection-flow error taxonomy.

use std::time::Duration;

use conduit_core::ConnectionState;
use conduit_fetch::ExchangeError;
use thiserror::Error;

/// Why a connection attempt failed.
///
/// Every variant is recoverable: the pair is back at `Disconnected` and the
/// operator may simply try again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// The provider has no registry entry.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Requesting the consent URL failed.
    #[error("Authorization request failed{}: {detail}", status_suffix(.status))]
    AuthorizationRequestFailed {
        /// HTTP status, if the server answered.
        status: Option<u16>,
        /// Server or transport detail.
        detail: String,
    },

    /// The platform refused to open the consent window.
    #[error("Authorization window was blocked")]
    PopupBlocked,

    /// Redeeming credentials after consent failed.
    #[error("Credential redemption failed{}: {detail}", status_suffix(.status))]
    CredentialRedemptionFailed {
        /// HTTP status, if the server answered.
        status: Option<u16>,
        /// Server or transport detail.
        detail: String,
    },

    /// Consent was not completed within the configured maximum wait.
    #[error("Timed out after {}s waiting for authorization", .0.as_secs())]
    TimedOut(Duration),
}

impl ConnectError {
    /// Wraps a failure of the authorize round trip.
    pub fn authorization(error: &ExchangeError) -> Self {
        Self::AuthorizationRequestFailed {
            status: error.status(),
            detail: error.detail().to_string(),
        }
    }

    /// Wraps a failure of the redemption round trip.
    pub fn redemption(error: &ExchangeError) -> Self {
        Self::CredentialRedemptionFailed {
            status: error.status(),
            detail: error.detail().to_string(),
        }
    }

    /// Returns the HTTP status, if a server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthorizationRequestFailed { status, .. }
            | Self::CredentialRedemptionFailed { status, .. } => *status,
            _ => None,
        }
    }

    /// Short machine-readable kind, used in event details.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownProvider(_) => "unknown_provider",
            Self::AuthorizationRequestFailed { .. } => "authorization_request_failed",
            Self::PopupBlocked => "popup_blocked",
            Self::CredentialRedemptionFailed { .. } => "credential_redemption_failed",
            Self::TimedOut(_) => "timed_out",
        }
    }

    /// The single message shown to the operator.
    ///
    /// Server details are passed through as-is when present.
    pub fn user_message(&self) -> String {
        match self {
            Self::UnknownProvider(name) => format!("{name} is not a supported integration."),
            Self::AuthorizationRequestFailed { detail, .. } if !detail.trim().is_empty() => detail.clone(),
            Self::AuthorizationRequestFailed { .. } => {
                "Could not start authorization. Please try again.".to_string()
            }
            Self::PopupBlocked => {
                "The authorization window was blocked. Allow popups for this app and try again."
                    .to_string()
            }
            Self::CredentialRedemptionFailed { detail, .. } if !detail.trim().is_empty() => detail.clone(),
            Self::CredentialRedemptionFailed { .. } => {
                "Could not retrieve credentials. Please try again.".to_string()
            }
            Self::TimedOut(limit) => format!(
                "Authorization was not completed within {} seconds. Please try again.",
                limit.as_secs()
            ),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// How a call to `connect` ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Credentials were obtained and handed to the session.
    Connected,
    /// Nothing was done because the pair was already in this state.
    Suppressed(ConnectionState),
    /// The window closed without credentials; consent was abandoned.
    NoCredentials,
    /// The attempt failed and was reported.
    Failed(ConnectError),
    /// The attempt was cancelled, the session was reset, or the controller
    /// shut down.
    Aborted,
}

impl ConnectOutcome {
    /// Returns true if the provider ended up connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns the error, if the attempt failed.
    pub fn error(&self) -> Option<&ConnectError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_server_detail() {
        let err = ConnectError::CredentialRedemptionFailed {
            status: Some(400),
            detail: "No credentials found.".to_string(),
        };
        assert_eq!(err.user_message(), "No credentials found.");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_user_message_fallbacks() {
        let err = ConnectError::AuthorizationRequestFailed {
            status: Some(500),
            detail: String::new(),
        };
        assert!(err.user_message().contains("try again"));
        assert!(ConnectError::PopupBlocked.user_message().contains("blocked"));
        assert!(
            ConnectError::TimedOut(Duration::from_secs(600))
                .user_message()
                .contains("600 seconds")
        );
    }

    #[test]
    fn test_wraps_exchange_errors_by_step() {
        let exchange = ExchangeError::AuthorizationRequestFailed {
            status: None,
            detail: "connection refused".to_string(),
        };
        assert_eq!(
            ConnectError::redemption(&exchange),
            ConnectError::CredentialRedemptionFailed {
                status: None,
                detail: "connection refused".to_string()
            }
        );
        assert_eq!(ConnectError::authorization(&exchange).kind(), "authorization_request_failed");
    }
}
