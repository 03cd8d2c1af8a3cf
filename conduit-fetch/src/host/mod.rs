//! Host API abstractions.
//!
//! - [`http`] - HTTP client for the integration API
//! - [`window`] - Browsing-context platform for authorization windows

pub mod http;
pub mod window;
