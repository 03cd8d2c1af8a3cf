//! Provider descriptor system.
//!
//! A descriptor contains all the static configuration for a provider:
//! - Metadata (display name, category, consent window title)
//! - Wire routes (authorize, credentials, and data paths)
//! - CLI configuration (name and aliases)

use conduit_core::ProviderKind;

// ============================================================================
// Provider Descriptor
// ============================================================================

/// Complete descriptor for a provider.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    /// Provider identifier.
    pub id: ProviderKind,
    /// Display metadata.
    pub metadata: ProviderMetadata,
    /// Wire-protocol fragment used to build requests.
    pub routes: WireRoutes,
    /// CLI naming.
    pub cli: CliConfig,
}

impl ProviderDescriptor {
    /// Creates a new descriptor builder.
    pub fn builder(id: ProviderKind) -> ProviderDescriptorBuilder {
        ProviderDescriptorBuilder::new(id)
    }

    /// Returns the display name.
    pub fn display_name(&self) -> &str {
        &self.metadata.display_name
    }

    /// Returns the CLI name.
    pub fn cli_name(&self) -> &str {
        self.cli.name
    }

    /// Returns the title used for the authorization window.
    pub fn window_title(&self) -> &str {
        &self.metadata.window_title
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Human-facing provider information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMetadata {
    /// Display name, e.g. `HubSpot`.
    pub display_name: String,
    /// What kind of data source this is.
    pub category: String,
    /// Title of the consent window.
    pub window_title: String,
    /// Item types the data endpoint returns.
    pub item_types: &'static [&'static str],
    /// Where the operator can manage the connected app.
    pub dashboard_url: Option<String>,
}

impl ProviderMetadata {
    /// Creates minimal metadata derived from the provider kind.
    pub fn for_provider(id: ProviderKind) -> Self {
        Self {
            display_name: id.display_name().to_string(),
            category: id.category().to_string(),
            window_title: format!("{} Authorization", id.display_name()),
            item_types: &[],
            dashboard_url: None,
        }
    }
}

// ============================================================================
// Wire Routes
// ============================================================================

/// Request paths for one provider, relative to the API base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRoutes {
    /// `POST` with identity, answers with the consent URL.
    pub authorize_path: String,
    /// `POST` with identity, answers with the credential payload or nothing.
    pub credentials_path: String,
    /// `POST` with credentials, answers with the provider's items.
    pub data_path: String,
}

impl WireRoutes {
    /// Routes under `/integrations/{slug}/`.
    pub fn integrations(slug: &str) -> Self {
        Self {
            authorize_path: format!("/integrations/{slug}/authorize"),
            credentials_path: format!("/integrations/{slug}/credentials"),
            data_path: format!("/integrations/{slug}/load"),
        }
    }
}

// ============================================================================
// CLI Config
// ============================================================================

/// CLI naming for a provider.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Primary CLI name.
    pub name: &'static str,
    /// Alternative names.
    pub aliases: &'static [&'static str],
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ProviderDescriptor`].
pub struct ProviderDescriptorBuilder {
    id: ProviderKind,
    metadata: Option<ProviderMetadata>,
    routes: Option<WireRoutes>,
    cli: Option<CliConfig>,
}

impl ProviderDescriptorBuilder {
    /// Creates a new builder for the given provider.
    pub fn new(id: ProviderKind) -> Self {
        Self {
            id,
            metadata: None,
            routes: None,
            cli: None,
        }
    }

    /// Sets the metadata.
    #[must_use]
    pub fn metadata(mut self, metadata: ProviderMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Sets the wire routes.
    #[must_use]
    pub fn routes(mut self, routes: WireRoutes) -> Self {
        self.routes = Some(routes);
        self
    }

    /// Sets the CLI configuration.
    #[must_use]
    pub fn cli(mut self, cli: CliConfig) -> Self {
        self.cli = Some(cli);
        self
    }

    /// Builds the descriptor.
    ///
    /// Routes default to `/integrations/{cli_name}/...`.
    pub fn build(self) -> ProviderDescriptor {
        let cli = self.cli.unwrap_or(CliConfig {
            name: self.id.cli_name(),
            aliases: &[],
        });
        ProviderDescriptor {
            id: self.id,
            metadata: self
                .metadata
                .unwrap_or_else(|| ProviderMetadata::for_provider(self.id)),
            routes: self
                .routes
                .unwrap_or_else(|| WireRoutes::integrations(cli.name)),
            cli,
        }
    }
}
