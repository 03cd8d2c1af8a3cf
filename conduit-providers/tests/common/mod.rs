//! Test doubles for the connection flow.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use conduit_core::{Credentials, MemorySink, ProviderKind, SessionIdentity};
use conduit_fetch::{AuthorizationUrl, BrowsingPlatform, ExchangeError, WindowHandle, WindowRequest};
use conduit_providers::{
    AuthorizationWindowController, ControllerConfig, CredentialExchange, RecordingReporter,
    Redemption,
};
use conduit_store::SessionContext;
use serde_json::json;

pub const CONSENT_URL: &str = "https://app.hubspot.com/oauth/authorize?state=abc";

pub fn identity() -> SessionIdentity {
    SessionIdentity::new("TestUser", "TestOrg")
}

pub fn credentials() -> Credentials {
    Credentials::from_payload(json!({"access_token": "tok", "refresh_token": "ref"})).unwrap()
}

// ============================================================================
// Exchange
// ============================================================================

/// Scripted credential exchange.
pub struct FakeExchange {
    authorize: Mutex<Result<AuthorizationUrl, ExchangeError>>,
    redeem: Mutex<Result<Redemption, ExchangeError>>,
    delay: Duration,
    authorize_calls: AtomicUsize,
    redeem_calls: AtomicUsize,
}

impl FakeExchange {
    pub fn new() -> Self {
        Self {
            authorize: Mutex::new(Ok(AuthorizationUrl::parse(CONSENT_URL).unwrap())),
            redeem: Mutex::new(Ok(Redemption::Credentials(credentials()))),
            delay: Duration::ZERO,
            authorize_calls: AtomicUsize::new(0),
            redeem_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_authorize(self, status: u16, detail: &str) -> Self {
        *self.authorize.lock().unwrap() = Err(ExchangeError::AuthorizationRequestFailed {
            status: Some(status),
            detail: detail.to_string(),
        });
        self
    }

    pub fn set_redeem(&self, result: Result<Redemption, ExchangeError>) {
        *self.redeem.lock().unwrap() = result;
    }

    pub fn authorize_calls(&self) -> usize {
        self.authorize_calls.load(Ordering::SeqCst)
    }

    pub fn redeem_calls(&self) -> usize {
        self.redeem_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl CredentialExchange for FakeExchange {
    async fn request_authorization_url(
        &self,
        _provider: ProviderKind,
        _identity: &SessionIdentity,
    ) -> Result<AuthorizationUrl, ExchangeError> {
        self.authorize_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.authorize.lock().unwrap().clone()
    }

    async fn redeem_credentials(
        &self,
        _provider: ProviderKind,
        _identity: &SessionIdentity,
    ) -> Result<Redemption, ExchangeError> {
        self.redeem_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.redeem.lock().unwrap().clone()
    }
}

// ============================================================================
// Platform
// ============================================================================

/// Scripted browsing platform.
///
/// The window reports closed after `close_after` polls, or once
/// [`FakePlatform::close_window`] is called.
pub struct FakePlatform {
    refuse: bool,
    close_after: Option<usize>,
    closed: AtomicBool,
    opens: AtomicUsize,
    polls: AtomicUsize,
    closes: AtomicUsize,
    titles: Mutex<Vec<String>>,
}

impl FakePlatform {
    /// A window the user closes after `polls` checks.
    pub fn closing_after(polls: usize) -> Self {
        Self {
            close_after: Some(polls),
            ..Self::never_closing()
        }
    }

    /// A window that stays open until told otherwise.
    pub fn never_closing() -> Self {
        Self {
            refuse: false,
            close_after: None,
            closed: AtomicBool::new(false),
            opens: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            titles: Mutex::new(Vec::new()),
        }
    }

    /// A platform that blocks every window.
    pub fn blocking() -> Self {
        Self {
            refuse: true,
            ..Self::never_closing()
        }
    }

    pub fn close_window(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn titles(&self) -> Vec<String> {
        self.titles.lock().unwrap().clone()
    }
}

impl BrowsingPlatform for FakePlatform {
    fn open(&self, request: &WindowRequest<'_>) -> Option<WindowHandle> {
        if self.refuse {
            return None;
        }
        let id = self.opens.fetch_add(1, Ordering::SeqCst) as u64 + 1;
        self.titles.lock().unwrap().push(request.title.clone());
        Some(WindowHandle::new(id))
    }

    fn is_closed(&self, _handle: WindowHandle) -> bool {
        let polls = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        self.closed.load(Ordering::SeqCst) || self.close_after.is_some_and(|n| polls >= n)
    }

    fn close(&self, _handle: WindowHandle) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A controller wired to fakes, with handles on every collaborator.
pub struct Harness {
    pub controller: Arc<AuthorizationWindowController>,
    pub exchange: Arc<FakeExchange>,
    pub platform: Arc<FakePlatform>,
    pub session: SessionContext,
    pub events: Arc<MemorySink>,
    pub reporter: Arc<RecordingReporter>,
}

impl Harness {
    pub fn new(exchange: FakeExchange, platform: FakePlatform) -> Self {
        Self::with_config(exchange, platform, ControllerConfig::default())
    }

    pub fn with_config(exchange: FakeExchange, platform: FakePlatform, config: ControllerConfig) -> Self {
        let exchange = Arc::new(exchange);
        let platform = Arc::new(platform);
        let session = SessionContext::new(identity());
        let events = Arc::new(MemorySink::new());
        let reporter = Arc::new(RecordingReporter::new());

        let controller = AuthorizationWindowController::builder(
            exchange.clone(),
            platform.clone(),
            session.clone(),
        )
        .events(events.clone())
        .reporter(reporter.clone())
        .config(config)
        .build();

        Self {
            controller: Arc::new(controller),
            exchange,
            platform,
            session,
            events,
            reporter,
        }
    }
}
