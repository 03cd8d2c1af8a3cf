//! Connect command - run one OAuth connection flow.
//!
//! The consent page opens in the system browser. A browser tab cannot tell
//! this process that it was closed, so the operator presses Enter once the
//! provider's page is done.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use clap::Args;
use conduit_core::SessionIdentity;
use conduit_fetch::SystemBrowser;
use conduit_providers::{
    AuthorizationWindowController, ConnectOutcome, ControllerConfig, IntegrationClient,
};
use conduit_store::{SessionContext, Settings, save_json};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use super::{fetch_context, resolve_provider};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the connect command.
#[derive(Args)]
pub struct ConnectArgs {
    /// Provider to connect (name or alias). Defaults to `default_provider`.
    pub provider: Option<String>,

    /// User id for the session (overrides settings).
    #[arg(long)]
    pub user: Option<String>,

    /// Org id for the session (overrides settings).
    #[arg(long)]
    pub org: Option<String>,

    /// Write the credentials to this file instead of printing them.
    #[arg(long, value_name = "PATH")]
    pub save: Option<PathBuf>,

    /// Print the consent URL instead of launching the browser.
    #[arg(long)]
    pub no_browser: bool,
}

impl ConnectArgs {
    fn identity(&self, settings: &Settings) -> SessionIdentity {
        SessionIdentity::new(
            self.user.as_deref().unwrap_or(&settings.default_user),
            self.org.as_deref().unwrap_or(&settings.default_org),
        )
    }
}

/// Runs the connect command.
pub async fn run(args: &ConnectArgs, cli: &Cli, settings: &Settings) -> Result<()> {
    let desc = resolve_provider(args.provider.as_deref(), settings)?;
    let identity = args.identity(settings);
    if !identity.is_complete() {
        warn!(identity = %identity, "Session identity is incomplete; the server may reject it");
    }

    let ctx = fetch_context(settings)?;
    let (browser, mut opened) = SystemBrowser::with_open_notifications();
    let browser = if args.no_browser || !settings.open_browser {
        Arc::new(browser.without_launch())
    } else {
        Arc::new(browser)
    };

    let session = SessionContext::new(identity.clone());
    let controller = AuthorizationWindowController::builder(
        Arc::new(IntegrationClient::from_context(&ctx)),
        browser.clone(),
        session.clone(),
    )
    .config(
        ControllerConfig::default()
            .with_poll_interval(settings.poll_interval())
            .with_max_wait(settings.max_wait()),
    )
    .build();

    let quiet = cli.quiet;
    let prompt_browser = Arc::clone(&browser);
    let prompt = tokio::spawn(async move {
        let mut stdin = BufReader::new(tokio::io::stdin());
        while let Some(window) = opened.recv().await {
            if !quiet {
                eprintln!("{}: complete authorization at", window.title);
                eprintln!("  {}", window.url);
                eprintln!("Press Enter once the page has finished.");
            }
            let mut line = String::new();
            if let Err(e) = stdin.read_line(&mut line).await {
                warn!(error = %e, "Failed to read from stdin");
            }
            prompt_browser.mark_closed(window.handle);
        }
    });

    info!(provider = %desc.display_name(), identity = %identity, "Connecting");
    let outcome = tokio::select! {
        outcome = controller.connect(desc.id) => outcome,
        _ = tokio::signal::ctrl_c() => {
            controller.shutdown();
            ConnectOutcome::Aborted
        }
    };
    prompt.abort();

    let credentials = match &outcome {
        ConnectOutcome::Connected => Some(
            session
                .credentials(desc.id)
                .await
                .ok_or_else(|| anyhow!("{} credentials were not handed over", desc.display_name()))?,
        ),
        ConnectOutcome::Failed(error) => bail!("{}", error.user_message()),
        ConnectOutcome::Aborted => bail!("Connection to {} cancelled", desc.display_name()),
        ConnectOutcome::NoCredentials | ConnectOutcome::Suppressed(_) => None,
    };

    if let (Some(path), Some(credentials)) = (&args.save, &credentials) {
        save_json(path, credentials.payload()).await?;
        info!(path = %path.display(), "Credentials saved");
    }
    let printed = if args.save.is_some() { None } else { credentials.as_ref() };

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_outcome(desc, &outcome));
            if let (Some(path), Some(_)) = (&args.save, &credentials) {
                println!("Saved to {}", path.display());
            }
            if let Some(credentials) = printed {
                println!("{}", serde_json::to_string_pretty(credentials.payload())?);
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_outcome(desc, &identity, &outcome, printed)?);
        }
    }

    Ok(())
}
