//! JSON output formatting.

use anyhow::Result;
use conduit_core::{Credentials, SessionIdentity};
use conduit_providers::{ConnectOutcome, ProviderDescriptor};
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// Output Types
// ============================================================================

/// Provider info output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfoOutput {
    pub id: String,
    pub display_name: String,
    pub category: String,
    pub cli_name: String,
    pub aliases: Vec<String>,
    pub routes: RoutesOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,
}

/// Wire routes of a provider.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutesOutput {
    pub authorize: String,
    pub credentials: String,
    pub load: String,
}

/// Result of a connect run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOutput {
    pub provider: String,
    pub user_id: String,
    pub org_id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Value>,
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize + ?Sized>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats provider list.
    pub fn format_providers(&self, providers: &[ProviderDescriptor]) -> Result<String> {
        let outputs: Vec<ProviderInfoOutput> = providers
            .iter()
            .map(|desc| ProviderInfoOutput {
                id: desc.cli_name().to_string(),
                display_name: desc.display_name().to_string(),
                category: desc.metadata.category.clone(),
                cli_name: desc.cli_name().to_string(),
                aliases: desc.cli.aliases.iter().map(ToString::to_string).collect(),
                routes: RoutesOutput {
                    authorize: desc.routes.authorize_path.clone(),
                    credentials: desc.routes.credentials_path.clone(),
                    load: desc.routes.data_path.clone(),
                },
                dashboard_url: desc.metadata.dashboard_url.clone(),
            })
            .collect();

        self.format(&outputs)
    }

    /// Formats how a connection attempt ended.
    pub fn format_outcome(
        &self,
        desc: &ProviderDescriptor,
        identity: &SessionIdentity,
        outcome: &ConnectOutcome,
        credentials: Option<&Credentials>,
    ) -> Result<String> {
        let (status, state, error) = match outcome {
            ConnectOutcome::Connected => ("connected", None, None),
            ConnectOutcome::NoCredentials => ("no_credentials", None, None),
            ConnectOutcome::Suppressed(state) => ("suppressed", Some(state.to_string()), None),
            ConnectOutcome::Failed(e) => ("failed", None, Some(e.user_message())),
            ConnectOutcome::Aborted => ("aborted", None, None),
        };

        self.format(&ConnectOutput {
            provider: desc.cli_name().to_string(),
            user_id: identity.user.clone(),
            org_id: identity.org.clone(),
            status,
            state,
            error,
            credentials: credentials.map(|c| c.payload().clone()),
        })
    }
}
