// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Conduit Providers
//!
//! Provider registry, credential exchange and the connection flow.
//!
//! Each provider module contributes a static descriptor:
//!
//! - **Metadata**: display name, category, consent window title
//! - **Routes**: the integration API endpoints for authorize, credentials
//!   and data loading
//! - **CLI**: command-line name and aliases
//!
//! ## Supported Providers
//!
//! | Provider | Category | CLI | Aliases |
//! |----------|----------|-----|---------|
//! | Notion | Knowledge base | `notion` | |
//! | Airtable | Database | `airtable` | `at` |
//! | HubSpot | CRM | `hubspot` | `hs` |
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use conduit_core::{ProviderKind, SessionIdentity};
//! use conduit_fetch::{FetchContext, SystemBrowser};
//! use conduit_providers::{AuthorizationWindowController, IntegrationClient};
//! use conduit_store::SessionContext;
//!
//! let ctx = FetchContext::builder().build()?;
//! let controller = AuthorizationWindowController::builder(
//!     Arc::new(IntegrationClient::from_context(&ctx)),
//!     Arc::new(SystemBrowser::new()),
//!     SessionContext::new(SessionIdentity::new("user-1", "org-1")),
//! )
//! .build();
//!
//! let outcome = controller.connect(ProviderKind::HubSpot).await;
//! ```

pub mod client;
pub mod connect;
pub mod descriptor;
pub mod exchange;
pub mod registry;

// Provider modules (alphabetical)
pub mod airtable;
pub mod hubspot;
pub mod notion;

// Re-export key types
pub use client::IntegrationClient;
pub use connect::{
    AuthorizationWindowController, ConnectError, ConnectOutcome, ConnectReporter,
    ControllerBuilder, ControllerConfig, RecordingReporter, Report, TracingReporter,
};
pub use descriptor::{
    CliConfig, ProviderDescriptor, ProviderDescriptorBuilder, ProviderMetadata, WireRoutes,
};
pub use exchange::{CredentialExchange, Redemption};
pub use registry::ProviderRegistry;

// Re-export provider descriptors
pub use airtable::airtable_descriptor;
pub use hubspot::hubspot_descriptor;
pub use notion::notion_descriptor;
