//! Credential exchange seam.
//!
//! The connection flow talks to the integration API through
//! [`CredentialExchange`], which performs the two round trips of an OAuth
//! connection from the client's side:
//!
//! 1. ask for the provider's consent URL
//! 2. after the consent window closes, redeem whatever credentials the
//!    server collected
//!
//! Neither operation retries; failures are surfaced to the caller.

use async_trait::async_trait;
use conduit_core::{Credentials, ProviderKind, SessionIdentity};
use conduit_fetch::{AuthorizationUrl, ExchangeError};
use serde_json::Value;

/// Result of a credential redemption.
#[derive(Debug, Clone, PartialEq)]
pub enum Redemption {
    /// The server handed over a credential payload.
    Credentials(Credentials),
    /// The server had nothing for this identity, usually because consent was
    /// abandoned. Not an error.
    NoCredentialsYet,
}

/// The two network round trips of a connection attempt.
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    /// Requests the consent URL for `provider`.
    async fn request_authorization_url(
        &self,
        provider: ProviderKind,
        identity: &SessionIdentity,
    ) -> Result<AuthorizationUrl, ExchangeError>;

    /// Redeems the credentials collected for `identity` after consent.
    async fn redeem_credentials(
        &self,
        provider: ProviderKind,
        identity: &SessionIdentity,
    ) -> Result<Redemption, ExchangeError>;
}

// ============================================================================
// Body Parsing
// ============================================================================

/// Reads the consent URL from an authorize response body.
///
/// The server answers with a JSON string; a bare URL is accepted too.
pub fn parse_authorization_url(body: &str) -> Result<AuthorizationUrl, String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err("empty authorization response".to_string());
    }

    let raw = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::String(url)) => url,
        Ok(other) => {
            return Err(format!(
                "expected an authorization URL, got JSON {}",
                json_kind(&other)
            ));
        }
        Err(_) => trimmed.to_string(),
    };

    AuthorizationUrl::parse(&raw)
}

/// Reads a credentials response body.
///
/// An empty body, `null`, `false`, `""` or `{}` means nothing was collected.
pub fn parse_redemption(body: &str) -> Result<Redemption, String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(Redemption::NoCredentialsYet);
    }

    let payload: Value =
        serde_json::from_str(trimmed).map_err(|e| format!("malformed credentials payload: {e}"))?;

    Ok(Credentials::from_payload(payload).map_or(Redemption::NoCredentialsYet, Redemption::Credentials))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
