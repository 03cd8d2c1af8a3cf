//! Domain models for Conduit.
//!
//! ## Submodules
//!
//! - [`provider`] - Provider identifiers
//! - [`session`] - Session identity (user, org)
//! - [`credentials`] - Opaque credential payloads
//! - [`connection`] - Per-provider connection state
//! - [`item`] - Records loaded from a connected provider

mod connection;
mod credentials;
mod item;
mod provider;
mod session;

pub use connection::ConnectionState;
pub use credentials::Credentials;
pub use item::IntegrationItem;
pub use provider::ProviderKind;
pub use session::SessionIdentity;
