//! Notion provider descriptor.

use conduit_core::ProviderKind;

use crate::descriptor::{CliConfig, ProviderDescriptor, ProviderMetadata};

/// Creates the Notion provider descriptor.
pub fn notion_descriptor() -> ProviderDescriptor {
    ProviderDescriptor::builder(ProviderKind::Notion)
        .metadata(notion_metadata())
        .cli(CliConfig {
            name: "notion",
            aliases: &[],
        })
        .build()
}

fn notion_metadata() -> ProviderMetadata {
    ProviderMetadata {
        item_types: &["page", "database"],
        dashboard_url: Some("https://www.notion.so/my-integrations".to_string()),
        ..ProviderMetadata::for_provider(ProviderKind::Notion)
    }
}
