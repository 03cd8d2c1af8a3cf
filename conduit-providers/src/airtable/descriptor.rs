//! Airtable provider descriptor.

use conduit_core::ProviderKind;

use crate::descriptor::{CliConfig, ProviderDescriptor, ProviderMetadata};

/// Creates the Airtable provider descriptor.
pub fn airtable_descriptor() -> ProviderDescriptor {
    ProviderDescriptor::builder(ProviderKind::Airtable)
        .metadata(ProviderMetadata {
            item_types: &["base", "table"],
            dashboard_url: Some("https://airtable.com/create/oauth".to_string()),
            ..ProviderMetadata::for_provider(ProviderKind::Airtable)
        })
        .cli(CliConfig {
            name: "airtable",
            aliases: &["at"],
        })
        .build()
}
