// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Conduit Store
//!
//! State management for Conduit.
//!
//! This crate provides:
//!
//! - **ConnectionStore**: Per-(provider, identity) connection state machine
//! - **SessionContext**: Current identity and the credentials handed over to it
//! - **SettingsStore**: User preferences with persistence
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use conduit_store::{ConnectionStore, SessionContext};
//! use conduit_core::{ProviderKind, SessionIdentity};
//!
//! let connections = ConnectionStore::new();
//! let session = SessionContext::new(SessionIdentity::new("TestUser", "TestOrg"));
//!
//! let identity = session.identity().await;
//! if let Ok(ticket) = connections.try_begin(ProviderKind::HubSpot, &identity).await {
//!     // ... run the consent flow ...
//!     connections.mark_connected(&ticket).await;
//! }
//! ```

pub mod connection_store;
pub mod error;
pub mod persistence;
pub mod session;
pub mod settings_store;

pub use connection_store::{AttemptTicket, ConnectionStore, StateChange};
pub use error::StoreError;
pub use persistence::{
    default_config_dir, default_settings_path, load_json, load_json_or_default,
    save_json,
};
pub use session::{CredentialsUpdate, Handover, SessionContext};
pub use settings_store::{LogLevel, Settings, SettingsStore};
