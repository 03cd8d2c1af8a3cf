//! Connection flow.
//!
//! [`AuthorizationWindowController`] runs OAuth connection attempts end to
//! end. Failures are typed as [`ConnectError`] and surfaced once through a
//! [`ConnectReporter`]; every call resolves to a [`ConnectOutcome`].

mod controller;
mod error;
mod report;

pub use controller::{
    AuthorizationWindowController, ControllerBuilder, ControllerConfig, DEFAULT_MAX_WAIT,
    DEFAULT_POLL_INTERVAL,
};
pub use error::{ConnectError, ConnectOutcome};
pub use report::{ConnectReporter, RecordingReporter, Report, TracingReporter};
