//! User preferences store.
//!
//! Manages settings with persistence and change notification.

use conduit_core::{ProviderKind, SessionIdentity};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::{default_settings_path, load_json_or_default, save_json};

// ============================================================================
// Settings Types
// ============================================================================

/// User preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Integration API base URL.
    pub api_base_url: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Closure-detection poll interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Maximum time to wait for consent, in seconds. `None` waits forever.
    pub max_wait_secs: Option<u64>,

    /// User id sent when none is given on the command line.
    pub default_user: String,

    /// Org id sent when none is given on the command line.
    pub default_org: String,

    /// Provider used when none is given on the command line.
    pub default_provider: Option<ProviderKind>,

    /// Launch the system browser for the consent page.
    pub open_browser: bool,

    /// Log level.
    pub log_level: LogLevel,

    /// Hosts the HTTP client may reach. Empty means unrestricted.
    pub allowed_domains: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
            poll_interval_ms: 200,
            max_wait_secs: Some(600),
            default_user: "TestUser".to_string(),
            default_org: "TestOrg".to_string(),
            default_provider: None,
            open_browser: true,
            log_level: LogLevel::default(),
            allowed_domains: Vec::new(),
        }
    }
}

impl Settings {
    /// Keys accepted by [`Settings::set_field`].
    pub const KEYS: &'static [&'static str] = &[
        "api_base_url",
        "request_timeout_secs",
        "poll_interval_ms",
        "max_wait_secs",
        "default_user",
        "default_org",
        "default_provider",
        "open_browser",
        "log_level",
        "allowed_domains",
    ];

    /// Returns the per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the closure-detection poll interval (at least 1 ms).
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Returns the maximum consent wait, if bounded.
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }

    /// Returns the default session identity.
    pub fn default_identity(&self) -> SessionIdentity {
        SessionIdentity::new(&self.default_user, &self.default_org)
    }

    /// Sets a field from its textual form.
    ///
    /// Optional fields accept `none` to clear them; `allowed_domains` takes a
    /// comma-separated list.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let value = value.trim();
        match key {
            "api_base_url" => self.api_base_url = value.to_string(),
            "request_timeout_secs" => self.request_timeout_secs = parse_number(key, value)?,
            "poll_interval_ms" => {
                let ms = parse_number(key, value)?;
                if ms == 0 {
                    return Err(StoreError::invalid(key, "must be greater than zero"));
                }
                self.poll_interval_ms = ms;
            }
            "max_wait_secs" => {
                self.max_wait_secs = if is_none(value) {
                    None
                } else {
                    Some(parse_number(key, value)?)
                };
            }
            "default_user" => self.default_user = value.to_string(),
            "default_org" => self.default_org = value.to_string(),
            "default_provider" => {
                self.default_provider = if is_none(value) {
                    None
                } else {
                    Some(
                        ProviderKind::from_str(value)
                            .map_err(|e| StoreError::invalid(key, e.to_string()))?,
                    )
                };
            }
            "open_browser" => {
                self.open_browser = value
                    .parse()
                    .map_err(|_| StoreError::invalid(key, "expected true or false"))?;
            }
            "log_level" => self.log_level = value.parse()?,
            "allowed_domains" => {
                self.allowed_domains = value
                    .split(',')
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            other => return Err(StoreError::UnknownSetting(other.to_string())),
        }
        Ok(())
    }
}

fn is_none(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("none")
}

fn parse_number(key: &str, value: &str) -> Result<u64, StoreError> {
    value
        .parse()
        .map_err(|_| StoreError::invalid(key, format!("not a number: {value}")))
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error level logging.
    Error,
    /// Warning level logging.
    #[default]
    Warn,
    /// Info level logging.
    Info,
    /// Debug level logging.
    Debug,
    /// Trace level logging.
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(StoreError::invalid("log_level", format!("unknown level: {s}"))),
        }
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Persistent settings store with change notifications.
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
    notify: watch::Sender<u64>,
    version: Arc<RwLock<u64>>,
}

impl SettingsStore {
    /// Creates a store with default settings that saves to `path`.
    pub fn new(path: PathBuf) -> Self {
        Self::with_settings(path, Settings::default())
    }

    fn with_settings(path: PathBuf, settings: Settings) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
            notify,
            version: Arc::new(RwLock::new(0)),
        }
    }

    /// Loads settings from the default path.
    pub async fn load_default() -> Self {
        Self::load(default_settings_path()).await
    }

    /// Loads settings from a path.
    ///
    /// A missing or corrupt file yields defaults.
    pub async fn load(path: PathBuf) -> Self {
        let settings = if path.exists() {
            info!(path = %path.display(), "Loading settings");
            load_json_or_default(&path).await
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            Settings::default()
        };
        Self::with_settings(path, settings)
    }

    /// Returns the file this store saves to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets a copy of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Updates settings and notifies subscribers.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        {
            let mut settings = self.settings.write().await;
            f(&mut settings);
        }
        self.notify_change().await;
    }

    /// Sets one field from its textual form and notifies subscribers.
    pub async fn set_field(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.settings.write().await.set_field(key, value)?;
        self.notify_change().await;
        Ok(())
    }

    /// Restores defaults and notifies subscribers.
    pub async fn reset(&self) {
        self.update(|s| *s = Settings::default()).await;
    }

    /// Saves settings to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await;
        save_json(&self.path, &*settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    /// Subscribes to settings changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    async fn notify_change(&self) {
        let mut version = self.version.write().await;
        *version += 1;
        let _ = self.notify.send(*version);
    }
}

// ============================================================================
// Tests
// ============================================================================
