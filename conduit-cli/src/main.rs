// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Conduit CLI - connect data providers over OAuth from the command line.
//!
//! # Examples
//!
//! ```bash
//! # List providers and their routes
//! conduit providers
//!
//! # Connect HubSpot for a user/org and save the credentials
//! conduit connect hubspot --user alice --org acme --save hubspot.json
//!
//! # Load records with saved credentials
//! conduit load hubspot --credentials hubspot.json
//!
//! # JSON output against a remote API
//! conduit --api-url https://api.example.com --format json --pretty providers
//!
//! # Change a setting
//! conduit config set max_wait_secs 300
//! ```

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use conduit_store::{LogLevel, Settings};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{config, connect, load, providers};

// ============================================================================
// CLI Definition
// ============================================================================

/// Conduit CLI - OAuth provider connections.
#[derive(Parser)]
#[command(name = "conduit")]
#[command(about = "Connect data providers over OAuth")]
#[command(long_about = r#"
Conduit connects third-party data providers to a user/org session through
the integration API's OAuth flow, then loads records with the credentials.

Supported providers:
  • Notion (notion)
  • Airtable (airtable, at)
  • HubSpot (hubspot, hs)

Examples:
  conduit providers                       # List providers
  conduit connect hubspot                 # Run the consent flow
  conduit connect notion --save n.json    # Save credentials to a file
  conduit load notion --credentials n.json
"#)]
#[command(version)]
#[command(author = "Conduit Contributors")]
pub struct Cli {
    /// Subcommand to run. If none, lists providers.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Integration API base URL (overrides settings).
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Per-request timeout in seconds (overrides settings).
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Settings file to use instead of the default.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Applies command-line overrides on top of stored settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(url) = &self.api_url {
            settings.api_base_url.clone_from(url);
        }
        if let Some(secs) = self.timeout {
            settings.request_timeout_secs = secs;
        }
    }
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// List available providers (default if no command specified).
    #[command(visible_alias = "p")]
    Providers,

    /// Connect a provider through its consent page.
    #[command(visible_alias = "c")]
    Connect(connect::ConnectArgs),

    /// Load records from a provider with saved credentials.
    #[command(visible_alias = "l")]
    Load(load::LoadArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// Any failure.
    Error = 1,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(cli: &Cli, level: LogLevel) {
    if cli.quiet {
        return;
    }

    let filter = if cli.verbose {
        EnvFilter::new("conduit=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("conduit={level}")))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_ansi(!cli.no_color)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let store = commands::settings_store(&cli).await;
    let mut settings = store.get().await;
    setup_logging(&cli, settings.log_level);
    cli.apply_overrides(&mut settings);

    let result = match &cli.command {
        Some(Commands::Providers) | None => providers::run(&cli),
        Some(Commands::Connect(args)) => connect::run(args, &cli, &settings).await,
        Some(Commands::Load(args)) => load::run(args, &cli, &settings).await,
        Some(Commands::Config(args)) => config::run(args, &cli, &store).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(ExitCode::Error as i32);
    }

    std::process::exit(ExitCode::Success as i32);
}
