// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Conduit Fetch
//!
//! Host APIs used by the connection flow.
//!
//! ## Host APIs
//!
//! - [`host::http`] - HTTP client bound to the integration API, with tracing
//!   and an optional domain allowlist
//! - [`host::window`] - Browsing-context platform used for the provider's
//!   consent step
//!
//! ## Context
//!
//! [`context::FetchContext`] bundles the HTTP client with its
//! [`context::FetchSettings`] so provider clients can be built from one value.
//!
//! ## Example
//!
//! ```ignore
//! use conduit_fetch::FetchContext;
//!
//! let ctx = FetchContext::builder()
//!     .base_url("http://localhost:8000")
//!     .build()?;
//! let response = ctx.http.post_form("/integrations/hubspot/authorize", &form).await?;
//! ```

pub mod context;
pub mod error;
pub mod host;

// Errors
pub use error::{ExchangeError, HttpError};

// Host APIs
pub use host::{
    http::{HttpClient, read_error_detail},
    window::{AuthorizationUrl, BrowsingPlatform, OpenedWindow, SystemBrowser, WindowHandle, WindowRequest},
};

// Context
pub use context::{DEFAULT_BASE_URL, FetchContext, FetchContextBuilder, FetchSettings};
