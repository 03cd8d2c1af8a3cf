//! Structured lifecycle events.
//!
//! The connection flow reports what it is doing as [`LifecycleEvent`]s sent to
//! an injected [`EventSink`]. Recording is fire-and-forget: `record` returns
//! nothing, so a sink can never change the outcome of a connection attempt.
//!
//! ## Sinks
//!
//! - [`TracingSink`] - Emits each event through `tracing` (default)
//! - [`MemorySink`] - Keeps events in memory for inspection
//! - [`NullSink`] - Drops everything

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

// ============================================================================
// Event Types
// ============================================================================

/// Severity of a lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventLevel {
    /// Verbose diagnostics.
    Debug,
    /// Normal progress.
    Info,
    /// Recoverable problem.
    Warn,
    /// Failed operation.
    Error,
}

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventAction {
    /// An operator asked to connect a provider.
    ConnectRequested,
    /// The authorize endpoint returned a URL.
    AuthorizationUrlObtained,
    /// The authorization window was opened.
    WindowOpened,
    /// The authorization window was detected as closed.
    WindowClosed,
    /// Credentials were redeemed and handed to the session.
    CredentialsObtained,
    /// The window closed without credentials (consent abandoned).
    ConnectionCancelled,
    /// The attempt failed.
    ConnectionFailed,
    /// The session identity was reset.
    SessionReset,
    /// Items were loaded from a connected provider.
    DataLoad,
}

impl EventAction {
    /// Returns the wire name of this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectRequested => "connect-requested",
            Self::AuthorizationUrlObtained => "authorization-url-obtained",
            Self::WindowOpened => "window-opened",
            Self::WindowClosed => "window-closed",
            Self::CredentialsObtained => "credentials-obtained",
            Self::ConnectionCancelled => "connection-cancelled",
            Self::ConnectionFailed => "connection-failed",
            Self::SessionReset => "session-reset",
            Self::DataLoad => "data-load",
        }
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured diagnostic event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
    /// Severity.
    pub level: EventLevel,
    /// Emitting component, e.g. `HubSpotIntegration`.
    pub component: String,
    /// What happened.
    pub action: EventAction,
    /// Key/value details.
    pub details: BTreeMap<String, String>,
}

impl LifecycleEvent {
    /// Creates an event with no details.
    pub fn new(level: EventLevel, component: impl Into<String>, action: EventAction) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            component: component.into(),
            action,
            details: BTreeMap::new(),
        }
    }

    /// Creates an info-level event.
    pub fn info(component: impl Into<String>, action: EventAction) -> Self {
        Self::new(EventLevel::Info, component, action)
    }

    /// Creates an error-level event.
    pub fn error(component: impl Into<String>, action: EventAction) -> Self {
        Self::new(EventLevel::Error, component, action)
    }

    /// Adds a detail entry.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.details.insert(key.into(), value.to_string());
        self
    }

    /// Returns a detail value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Receives lifecycle events.
///
/// Implementations must not block and must not panic; failures are the
/// sink's own business.
pub trait EventSink: Send + Sync {
    /// Records an event.
    fn record(&self, event: &LifecycleEvent);
}

/// Emits lifecycle events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &LifecycleEvent) {
        let component = event.component.as_str();
        let action = event.action.as_str();
        let details = &event.details;
        match event.level {
            EventLevel::Debug => debug!(component, action, ?details, "lifecycle event"),
            EventLevel::Info => info!(component, action, ?details, "lifecycle event"),
            EventLevel::Warn => warn!(component, action, ?details, "lifecycle event"),
            EventLevel::Error => error!(component, action, ?details, "lifecycle event"),
        }
    }
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: &LifecycleEvent) {}
}

/// Keeps events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded events.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the recorded actions in order.
    pub fn actions(&self) -> Vec<EventAction> {
        self.events().iter().map(|e| e.action).collect()
    }

    /// Counts events with the given action.
    pub fn count(&self, action: EventAction) -> usize {
        self.events().iter().filter(|e| e.action == action).count()
    }

    /// Removes all recorded events.
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: &LifecycleEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

// ============================================================================
// Tests
// ============================================================================
