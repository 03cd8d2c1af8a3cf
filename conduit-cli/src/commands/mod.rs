//! CLI command implementations.

pub mod config;
pub mod connect;
pub mod load;
pub mod providers;

use anyhow::Result;
use conduit_fetch::FetchContext;
use conduit_providers::{ProviderDescriptor, ProviderRegistry};
use conduit_store::{Settings, SettingsStore};

use crate::Cli;

/// Loads the settings store from `--config` or the default path.
pub async fn settings_store(cli: &Cli) -> SettingsStore {
    match &cli.config {
        Some(path) => SettingsStore::load(path.clone()).await,
        None => SettingsStore::load_default().await,
    }
}

/// Builds the fetch context described by `settings`.
pub fn fetch_context(settings: &Settings) -> Result<FetchContext> {
    let ctx = FetchContext::builder()
        .base_url(&settings.api_base_url)
        .timeout(settings.request_timeout())
        .allowed_domains(settings.allowed_domains.clone())
        .build()?;
    Ok(ctx)
}

/// Resolves a provider argument, falling back to the configured default.
pub fn resolve_provider(
    name: Option<&str>,
    settings: &Settings,
) -> Result<&'static ProviderDescriptor> {
    match name {
        Some(name) => Ok(ProviderRegistry::resolve_name(name)?),
        None => {
            let kind = settings.default_provider.ok_or_else(|| {
                anyhow::anyhow!("No provider given and no default_provider configured")
            })?;
            ProviderRegistry::get(kind).ok_or_else(|| anyhow::anyhow!("Unknown provider: {kind}"))
        }
    }
}
