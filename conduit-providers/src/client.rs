//! HTTP credential exchange against the integration API.

use std::sync::Arc;

use async_trait::async_trait;
use conduit_core::{
    Credentials, EventAction, EventSink, IntegrationItem, LifecycleEvent, ProviderKind,
    SessionIdentity, TracingSink,
};
use conduit_fetch::{AuthorizationUrl, ExchangeError, FetchContext, HttpClient, HttpError, read_error_detail};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::exchange::{CredentialExchange, Redemption, parse_authorization_url, parse_redemption};
use crate::registry::ProviderRegistry;

/// Which round trip a request belongs to, for error mapping.
#[derive(Debug, Clone, Copy)]
enum Call {
    Authorize,
    Redeem,
    Load,
}

impl Call {
    fn error(self, status: Option<u16>, detail: impl Into<String>) -> ExchangeError {
        let detail = detail.into();
        match self {
            Call::Authorize => ExchangeError::AuthorizationRequestFailed { status, detail },
            Call::Redeem => ExchangeError::CredentialRedemptionFailed { status, detail },
            Call::Load => ExchangeError::LoadFailed { status, detail },
        }
    }
}

/// [`CredentialExchange`] over HTTP, plus item loading.
#[derive(Clone)]
pub struct IntegrationClient {
    http: Arc<HttpClient>,
    events: Arc<dyn EventSink>,
}

impl IntegrationClient {
    /// Creates a client over an existing HTTP client.
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self {
            http,
            events: Arc::new(TracingSink),
        }
    }

    /// Creates a client from a fetch context.
    pub fn from_context(ctx: &FetchContext) -> Self {
        Self::new(Arc::clone(&ctx.http))
    }

    /// Sends lifecycle events to `events`.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Posts a form and returns the body of a successful response.
    async fn post(&self, call: Call, path: &str, form: &[(&str, &str)]) -> Result<String, ExchangeError> {
        let response = self
            .http
            .post_form(path, form)
            .await
            .map_err(|e| call.error(None, transport_detail(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = read_error_detail(response).await;
            warn!(path, status = status.as_u16(), detail = %detail, "Request rejected");
            return Err(call.error(Some(status.as_u16()), detail));
        }

        response
            .text()
            .await
            .map_err(|e| call.error(Some(status.as_u16()), format!("failed to read response: {e}")))
    }

    /// Loads the items of a connected provider.
    #[instrument(skip(self, credentials), fields(provider = %provider))]
    pub async fn load_items(
        &self,
        provider: ProviderKind,
        credentials: &Credentials,
    ) -> Result<Vec<IntegrationItem>, ExchangeError> {
        let routes = ProviderRegistry::resolve(provider).map_err(|e| Call::Load.error(None, e.to_string()))?;
        let started = Instant::now();
        let payload = credentials.to_json_string();

        let result = async {
            let body = self
                .post(Call::Load, &routes.data_path, &[("credentials", payload.as_str())])
                .await?;
            serde_json::from_str::<Vec<IntegrationItem>>(&body)
                .map_err(|e| Call::Load.error(None, format!("malformed item list: {e}")))
        }
        .await;

        let elapsed = started.elapsed().as_millis();
        let event = match &result {
            Ok(items) => LifecycleEvent::info(provider.component_name(), EventAction::DataLoad)
                .detail("items_count", items.len()),
            Err(e) => LifecycleEvent::error(provider.component_name(), EventAction::DataLoad)
                .detail("error", e),
        };
        self.events.record(
            &event
                .detail("provider", provider.cli_name())
                .detail("endpoint", &routes.data_path)
                .detail("duration_ms", elapsed),
        );

        result
    }
}

#[async_trait]
impl CredentialExchange for IntegrationClient {
    #[instrument(skip(self, identity), fields(provider = %provider))]
    async fn request_authorization_url(
        &self,
        provider: ProviderKind,
        identity: &SessionIdentity,
    ) -> Result<AuthorizationUrl, ExchangeError> {
        let routes =
            ProviderRegistry::resolve(provider).map_err(|e| Call::Authorize.error(None, e.to_string()))?;
        let body = self
            .post(Call::Authorize, &routes.authorize_path, &identity.form_fields())
            .await?;

        let url = parse_authorization_url(&body).map_err(|detail| Call::Authorize.error(None, detail))?;
        debug!(host = ?url.host(), "Authorization URL received");
        Ok(url)
    }

    #[instrument(skip(self, identity), fields(provider = %provider))]
    async fn redeem_credentials(
        &self,
        provider: ProviderKind,
        identity: &SessionIdentity,
    ) -> Result<Redemption, ExchangeError> {
        let routes =
            ProviderRegistry::resolve(provider).map_err(|e| Call::Redeem.error(None, e.to_string()))?;
        let body = self
            .post(Call::Redeem, &routes.credentials_path, &identity.form_fields())
            .await?;

        let redemption = parse_redemption(&body).map_err(|detail| Call::Redeem.error(None, detail))?;
        debug!(
            has_credentials = matches!(redemption, Redemption::Credentials(_)),
            "Credentials redeemed"
        );
        Ok(redemption)
    }
}

impl std::fmt::Debug for IntegrationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegrationClient")
            .field("base_url", &self.http.base_url().as_str())
            .finish_non_exhaustive()
    }
}

fn transport_detail(error: &HttpError) -> String {
    if error.is_timeout() {
        "the integration server did not respond in time".to_string()
    } else {
        error.to_string()
    }
}
