//! Operator-facing outcome reporting.

use std::sync::{Mutex, PoisonError};

use conduit_core::{ProviderKind, SessionIdentity};
use tracing::{info, warn};

use super::error::ConnectError;

/// Tells the operator how an attempt ended.
///
/// The controller calls `report_error` exactly once per failed attempt and
/// `report_success` exactly once per connected attempt. Abandoned consent and
/// aborted attempts are not reported.
pub trait ConnectReporter: Send + Sync {
    /// The provider is connected.
    fn report_success(&self, provider: ProviderKind, identity: &SessionIdentity);

    /// The attempt failed; `error.user_message()` is what to show.
    fn report_error(&self, provider: ProviderKind, identity: &SessionIdentity, error: &ConnectError);
}

/// Reports through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ConnectReporter for TracingReporter {
    fn report_success(&self, provider: ProviderKind, identity: &SessionIdentity) {
        info!(provider = %provider, identity = %identity, "{provider} connected");
    }

    fn report_error(&self, provider: ProviderKind, identity: &SessionIdentity, error: &ConnectError) {
        warn!(provider = %provider, identity = %identity, kind = error.kind(), "{}", error.user_message());
    }
}

/// One recorded report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// A success report.
    Success(ProviderKind),
    /// An error report.
    Error(ProviderKind, ConnectError),
}

/// Keeps reports in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<Report>>,
}

impl RecordingReporter {
    /// Creates an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every report in order.
    pub fn reports(&self) -> Vec<Report> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of success reports.
    pub fn success_count(&self) -> usize {
        self.reports()
            .iter()
            .filter(|r| matches!(r, Report::Success(_)))
            .count()
    }

    /// Errors reported, in order.
    pub fn errors(&self) -> Vec<ConnectError> {
        self.reports()
            .into_iter()
            .filter_map(|r| match r {
                Report::Error(_, e) => Some(e),
                Report::Success(_) => None,
            })
            .collect()
    }

    fn push(&self, report: Report) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report);
    }
}

impl ConnectReporter for RecordingReporter {
    fn report_success(&self, provider: ProviderKind, _identity: &SessionIdentity) {
        self.push(Report::Success(provider));
    }

    fn report_error(&self, provider: ProviderKind, _identity: &SessionIdentity, error: &ConnectError) {
        self.push(Report::Error(provider, error.clone()));
    }
}
