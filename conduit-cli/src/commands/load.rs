//! Load command - fetch records with saved credentials.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Args;
use conduit_core::Credentials;
use conduit_providers::IntegrationClient;
use conduit_store::{Settings, load_json};
use serde_json::Value;
use tracing::info;

use super::{fetch_context, resolve_provider};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the load command.
#[derive(Args)]
pub struct LoadArgs {
    /// Provider to load from (name or alias). Defaults to `default_provider`.
    pub provider: Option<String>,

    /// Credentials file written by `conduit connect --save`.
    #[arg(long, short, value_name = "PATH")]
    pub credentials: PathBuf,
}

/// Runs the load command.
pub async fn run(args: &LoadArgs, cli: &Cli, settings: &Settings) -> Result<()> {
    let desc = resolve_provider(args.provider.as_deref(), settings)?;

    let payload: Value = load_json(&args.credentials)
        .await
        .with_context(|| format!("reading {}", args.credentials.display()))?;
    let credentials = Credentials::from_payload(payload)
        .ok_or_else(|| anyhow!("{} holds no credentials", args.credentials.display()))?;

    let ctx = fetch_context(settings)?;
    let client = IntegrationClient::from_context(&ctx);
    let items = client.load_items(desc.id, &credentials).await?;
    info!(provider = %desc.display_name(), count = items.len(), "Items loaded");

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_items(desc, &items));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&items)?);
        }
    }

    Ok(())
}
