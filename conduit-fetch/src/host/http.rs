//! HTTP client with tracing and domain allowlist.
//!
//! The client is bound to the integration API's base URL. Provider routes are
//! relative paths joined onto that base, and every request is checked against
//! the optional domain allowlist before it leaves the process.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::error::HttpError;

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string for Conduit.
const USER_AGENT: &str = concat!("Conduit/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and domain allowlist.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    base_url: Url,
    allowed_domains: Option<Vec<String>>,
}

impl HttpClient {
    /// Creates a client for the given API base with the default timeout.
    pub fn new(base_url: &str) -> Result<Self, HttpError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a client for the given API base with a custom timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, HttpError> {
        let base_url = Url::parse(base_url).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;
        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            inner,
            base_url,
            allowed_domains: None,
        })
    }

    /// Restricts requests to the given domains (and their subdomains).
    ///
    /// An empty list means no restriction.
    #[must_use]
    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = (!domains.is_empty()).then_some(domains);
        self
    }

    /// Returns the API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a route path against the API base.
    pub fn endpoint(&self, path: &str) -> Result<Url, HttpError> {
        self.base_url
            .join(path)
            .map_err(|e| HttpError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Checks if a URL's domain is allowed.
    fn is_domain_allowed(&self, url: &Url) -> Result<(), HttpError> {
        let Some(ref allowed) = self.allowed_domains else {
            return Ok(()); // No restrictions
        };

        let host = url
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl("No host in URL".to_string()))?;

        let allowed = allowed
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")));

        if allowed {
            Ok(())
        } else {
            Err(HttpError::DomainNotAllowed(host.to_string()))
        }
    }

    /// Performs a POST request with a url-encoded form body.
    #[instrument(skip(self, form), fields(path = %path))]
    pub async fn post_form<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        form: &T,
    ) -> Result<Response, HttpError> {
        let url = self.endpoint(path)?;
        self.is_domain_allowed(&url)?;
        debug!(url = %url, "POST request with form data");

        let response = self.inner.post(url).form(form).send().await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Returns the inner reqwest client for advanced operations.
    pub fn inner(&self) -> &Client {
        &self.inner
    }
}

// ============================================================================
// Error Bodies
// ============================================================================

/// Error body shape returned by the integration API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Reads a human-readable explanation from a failed response.
///
/// Prefers the server's `{"detail": ...}` field, then the raw body, then the
/// status reason phrase.
pub async fn read_error_detail(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    detail_from_body(status, &body)
}

fn detail_from_body(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return match parsed.detail {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn client() -> HttpClient {
        HttpClient::new("http://localhost:8000").unwrap()
    }

    #[test]
    fn test_endpoint_join() {
        let url = client().endpoint("/integrations/hubspot/authorize").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/integrations/hubspot/authorize");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpClient::new("not a url"),
            Err(HttpError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_domain_allowlist() {
        let client = client().with_allowed_domains(vec!["localhost".to_string(), "example.com".to_string()]);

        assert!(client.is_domain_allowed(&Url::parse("http://localhost:8000/x").unwrap()).is_ok());
        assert!(client.is_domain_allowed(&Url::parse("https://api.example.com/x").unwrap()).is_ok());
        assert!(matches!(
            client.is_domain_allowed(&Url::parse("https://evil.com/steal").unwrap()),
            Err(HttpError::DomainNotAllowed(host)) if host == "evil.com"
        ));
    }

    #[test]
    fn test_empty_allowlist_means_unrestricted() {
        let client = client().with_allowed_domains(Vec::new());
        assert!(client.is_domain_allowed(&Url::parse("https://any.domain.com").unwrap()).is_ok());
    }

    #[test]
    fn test_detail_from_fastapi_body() {
        let detail = detail_from_body(StatusCode::BAD_REQUEST, r#"{"detail":"No credentials found."}"#);
        assert_eq!(detail, "No credentials found.");
    }

    #[test]
    fn test_detail_from_structured_body() {
        let detail = detail_from_body(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail":[{"loc":["body","user_id"],"msg":"field required"}]}"#,
        );
        assert!(detail.contains("field required"));
    }

    #[test]
    fn test_detail_falls_back_to_body_then_reason() {
        assert_eq!(
            detail_from_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error\n"),
            "Internal Server Error"
        );
        assert_eq!(detail_from_body(StatusCode::BAD_GATEWAY, ""), "Bad Gateway");
    }
}
