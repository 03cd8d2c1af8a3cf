// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Conduit Core
//!
//! Core types, models, and the lifecycle event seam shared by every
//! Conduit crate.
//!
//! ## Key Types
//!
//! ### Provider & Session
//! - [`ProviderKind`] - Closed set of supported data providers
//! - [`SessionIdentity`] - The (user, org) pair scoping a connection
//! - [`Credentials`] - Opaque credential payload handed over after consent
//! - [`ConnectionState`] - Disconnected / Connecting / Connected
//!
//! ### Data
//! - [`IntegrationItem`] - A record loaded from a connected provider
//!
//! ### Diagnostics
//! - [`LifecycleEvent`] - Structured, fire-and-forget connection-flow event
//! - [`EventSink`] - Injected capability that receives lifecycle events

pub mod error;
pub mod event;
pub mod models;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    ConnectionState, Credentials, IntegrationItem, ProviderKind, SessionIdentity,
};

// Re-export event types
pub use event::{
    EventAction, EventLevel, EventSink, LifecycleEvent, MemorySink, NullSink, TracingSink,
};
