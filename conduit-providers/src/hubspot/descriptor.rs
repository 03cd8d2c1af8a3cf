//! HubSpot provider descriptor.

use conduit_core::ProviderKind;

use crate::descriptor::{CliConfig, ProviderDescriptor, ProviderMetadata, WireRoutes};

/// Creates the HubSpot provider descriptor.
pub fn hubspot_descriptor() -> ProviderDescriptor {
    ProviderDescriptor {
        id: ProviderKind::HubSpot,
        metadata: hubspot_metadata(),
        routes: WireRoutes::integrations("hubspot"),
        cli: CliConfig {
            name: "hubspot",
            aliases: &["hs"],
        },
    }
}

/// HubSpot metadata configuration.
fn hubspot_metadata() -> ProviderMetadata {
    ProviderMetadata {
        display_name: "HubSpot".to_string(),
        category: "CRM".to_string(),
        window_title: "HubSpot Authorization".to_string(),
        item_types: &["contact", "company", "deal"],
        dashboard_url: Some("https://app.hubspot.com".to_string()),
    }
}
