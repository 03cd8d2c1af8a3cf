//! Text output formatting with colors.

use chrono::{DateTime, Local, Utc};
use conduit_core::IntegrationItem;
use conduit_providers::{ConnectOutcome, ProviderDescriptor, WireRoutes};
use conduit_store::Settings;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    // ========================================================================
    // Providers
    // ========================================================================

    /// Formats provider list header.
    pub fn format_providers_header(&self) -> String {
        format!(
            "{:<12} {:<16} {:<10} {}",
            self.bold("Provider"),
            self.bold("Category"),
            self.bold("CLI"),
            self.bold("Aliases")
        )
    }

    /// Formats a single provider line.
    pub fn format_provider_line(&self, desc: &ProviderDescriptor) -> String {
        let aliases = if desc.cli.aliases.is_empty() {
            self.dim("−")
        } else {
            desc.cli.aliases.join(", ")
        };

        format!(
            "{:<12} {:<16} {:<10} {}",
            desc.display_name(),
            desc.metadata.category,
            desc.cli_name(),
            aliases
        )
    }

    /// Formats a provider's wire routes, indented under its line.
    pub fn format_routes(&self, routes: &WireRoutes) -> String {
        [
            ("authorize", &routes.authorize_path),
            ("credentials", &routes.credentials_path),
            ("load", &routes.data_path),
        ]
        .iter()
        .map(|(label, path)| format!("  {} {}", self.dim(&format!("{label:<12}")), path))
        .collect::<Vec<_>>()
        .join("\n")
    }

    // ========================================================================
    // Connect
    // ========================================================================

    /// Formats how a connection attempt ended.
    pub fn format_outcome(&self, desc: &ProviderDescriptor, outcome: &ConnectOutcome) -> String {
        let name = self.bold(desc.display_name());
        match outcome {
            ConnectOutcome::Connected => format!("{} {name} connected", self.green("✓")),
            ConnectOutcome::NoCredentials => format!(
                "{} {name} authorization was not completed; no credentials received",
                self.yellow("−")
            ),
            ConnectOutcome::Suppressed(state) => {
                format!("{} {name} is already {state}", self.dim("−"))
            }
            ConnectOutcome::Failed(error) => {
                format!("{} {name}: {}", self.red("✗"), error.user_message())
            }
            ConnectOutcome::Aborted => format!("{} {name} connection cancelled", self.yellow("−")),
        }
    }

    // ========================================================================
    // Items
    // ========================================================================

    /// Formats loaded items, directories first.
    pub fn format_items(&self, desc: &ProviderDescriptor, items: &[IntegrationItem]) -> String {
        let mut lines = Vec::new();
        lines.push(format!("{} Items", self.bold(desc.display_name())));
        lines.push("─".repeat(50));

        if items.is_empty() {
            lines.push(self.dim("No items"));
            return lines.join("\n");
        }

        let mut sorted: Vec<&IntegrationItem> = items.iter().collect();
        sorted.sort_by(|a, b| b.directory.cmp(&a.directory).then_with(|| a.name.cmp(&b.name)));

        for item in sorted {
            lines.push(self.format_item(item));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} items", items.len()));
        lines.join("\n")
    }

    /// Formats one item line.
    pub fn format_item(&self, item: &IntegrationItem) -> String {
        let icon = if item.directory { "▸" } else { "·" };
        let name = if item.name.is_empty() { &item.id } else { &item.name };

        let mut line = format!("{icon} {name} {}", self.dim(&format!("({})", item.item_type)));
        if let Some(parent) = &item.parent_path_or_name {
            line.push_str(&format!(" in {parent}"));
        }
        if let Some(modified) = item.last_modified_time {
            line.push_str(&format!("  {}", self.dim(&format_time(modified))));
        }
        if let Some(url) = &item.url {
            line.push_str(&format!("\n    {}", self.cyan(url)));
        }
        line
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Formats settings as aligned key/value lines.
    pub fn format_settings(&self, settings: &Settings) -> String {
        let max_wait = settings
            .max_wait_secs
            .map_or_else(|| "none".to_string(), |s| format!("{s}s"));
        let provider = settings
            .default_provider
            .map_or_else(|| "none".to_string(), |p| p.cli_name().to_string());
        let domains = if settings.allowed_domains.is_empty() {
            "any".to_string()
        } else {
            settings.allowed_domains.join(", ")
        };

        [
            ("API base URL", settings.api_base_url.clone()),
            ("Request timeout", format!("{}s", settings.request_timeout_secs)),
            ("Poll interval", format!("{}ms", settings.poll_interval_ms)),
            ("Max wait", max_wait),
            ("Default user", settings.default_user.clone()),
            ("Default org", settings.default_org.clone()),
            ("Default provider", provider),
            ("Open browser", settings.open_browser.to_string()),
            ("Log level", settings.log_level.to_string()),
            ("Allowed domains", domains),
        ]
        .iter()
        .map(|(label, value)| format!("{:<18} {value}", format!("{label}:")))
        .collect::<Vec<_>>()
        .join("\n")
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn colorize(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.colorize(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.colorize(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.colorize(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.colorize(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.colorize(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.colorize(CYAN, text)
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
