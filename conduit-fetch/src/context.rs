//! Fetch context providing access to host APIs.
//!
//! The fetch context is handed to provider clients and bundles the HTTP
//! client with the settings it was built from.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::HttpError;
use crate::host::http::HttpClient;

/// Default integration API base.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

// ============================================================================
// Fetch Settings
// ============================================================================

/// Settings for talking to the integration API.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// API base URL.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Domains requests may go to. Empty means unrestricted.
    pub allowed_domains: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            allowed_domains: Vec::new(),
        }
    }
}

impl FetchSettings {
    /// Returns settings with a custom timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Context provided to provider clients, giving access to host APIs.
pub struct FetchContext {
    /// HTTP client bound to the API base.
    pub http: Arc<HttpClient>,
    /// Settings the context was built from.
    pub settings: FetchSettings,
}

impl FetchContext {
    /// Creates a context from settings.
    pub fn with_settings(settings: FetchSettings) -> Result<Self, HttpError> {
        let http = HttpClient::with_timeout(&settings.base_url, settings.timeout)?
            .with_allowed_domains(settings.allowed_domains.clone());
        debug!(base_url = %settings.base_url, timeout = ?settings.timeout, "Fetch context created");

        Ok(Self {
            http: Arc::new(http),
            settings,
        })
    }

    /// Creates a builder for customizing the context.
    pub fn builder() -> FetchContextBuilder {
        FetchContextBuilder::new()
    }

    /// Returns the per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.settings.timeout
    }
}

impl std::fmt::Debug for FetchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`FetchContext`].
#[derive(Debug, Default)]
pub struct FetchContextBuilder {
    settings: FetchSettings,
}

impl FetchContextBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.settings.base_url = base_url.into();
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    /// Restricts requests to the given domains.
    #[must_use]
    pub fn allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.settings.allowed_domains = domains;
        self
    }

    /// Builds the context.
    pub fn build(self) -> Result<FetchContext, HttpError> {
        FetchContext::with_settings(self.settings)
    }
}
