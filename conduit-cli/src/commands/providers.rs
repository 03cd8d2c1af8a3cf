//! Providers command - list available providers.

use anyhow::Result;
use conduit_providers::ProviderRegistry;
use tracing::info;

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the providers command.
pub fn run(cli: &Cli) -> Result<()> {
    info!("Listing providers");

    let providers = ProviderRegistry::all();

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);

            println!("{}", formatter.format_providers_header());
            println!("{}", "─".repeat(70));

            for desc in providers {
                println!("{}", formatter.format_provider_line(desc));
                if cli.verbose {
                    println!("{}", formatter.format_routes(&desc.routes));
                }
            }

            println!();
            println!("Total: {} providers", providers.len());
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_providers(providers)?);
        }
    }

    Ok(())
}
