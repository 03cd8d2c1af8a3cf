//! Authorization window controller.
//!
//! Drives one end-to-end connection attempt per call to
//! [`AuthorizationWindowController::connect`]:
//!
//! 1. move the (provider, identity) pair to `Connecting`, or return at once
//!    if it is already `Connecting`/`Connected`
//! 2. request the consent URL
//! 3. open the consent window
//! 4. poll until the window is closed
//! 5. redeem credentials and settle the pair as `Connected` or `Disconnected`
//!
//! Every attempt owns a cancellation token that is a child of the
//! controller's lifecycle token. Polling and network calls race that token,
//! so cancel, session reset, shutdown and drop all stop an attempt at its next
//! suspension point, and no poll fires after the attempt is gone.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use conduit_core::{
    ConnectionState, Credentials, EventAction, EventLevel, EventSink, LifecycleEvent, ProviderKind,
    SessionIdentity, TracingSink,
};
use conduit_fetch::{BrowsingPlatform, WindowHandle, WindowRequest};
use conduit_store::{AttemptTicket, ConnectionStore, Handover, SessionContext};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::error::{ConnectError, ConnectOutcome};
use super::report::{ConnectReporter, TracingReporter};
use crate::descriptor::ProviderDescriptor;
use crate::exchange::{CredentialExchange, Redemption};
use crate::registry::ProviderRegistry;

/// Default closure-detection poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Default maximum wait for consent (the server's state-token lifetime).
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(600);

// ============================================================================
// Config
// ============================================================================

/// Timing configuration for connection attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// How often to check whether the consent window has closed.
    pub poll_interval: Duration,
    /// Upper bound on waiting for the window and redeeming credentials.
    /// `None` waits indefinitely.
    pub max_wait: Option<Duration>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: Some(DEFAULT_MAX_WAIT),
        }
    }
}

impl ControllerConfig {
    /// Sets the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the maximum wait.
    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }
}

// ============================================================================
// Internal Types
// ============================================================================

type AttemptKey = (ProviderKind, SessionIdentity);

struct ActiveAttempt {
    id: u64,
    token: CancellationToken,
}

/// How an attempt ended, before the store is settled.
enum Settle {
    Connected(Credentials),
    NoCredentials,
    Failed(ConnectError),
    Aborted,
}

/// Builds lifecycle events carrying the attempt's standard details.
struct EventScope {
    provider: ProviderKind,
    component: String,
    identity: SessionIdentity,
}

impl EventScope {
    fn new(provider: ProviderKind, identity: &SessionIdentity) -> Self {
        Self {
            provider,
            component: provider.component_name(),
            identity: identity.clone(),
        }
    }

    fn event(&self, level: EventLevel, action: EventAction) -> LifecycleEvent {
        LifecycleEvent::new(level, &self.component, action)
            .detail("provider", self.provider.cli_name())
            .detail("user_id", &self.identity.user)
            .detail("org_id", &self.identity.org)
    }

    fn info(&self, action: EventAction) -> LifecycleEvent {
        self.event(EventLevel::Info, action)
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Runs connection attempts for every provider, one at a time per
/// (provider, identity) pair.
pub struct AuthorizationWindowController {
    exchange: Arc<dyn CredentialExchange>,
    platform: Arc<dyn BrowsingPlatform>,
    connections: ConnectionStore,
    session: SessionContext,
    events: Arc<dyn EventSink>,
    reporter: Arc<dyn ConnectReporter>,
    config: ControllerConfig,
    lifecycle: CancellationToken,
    attempts: Mutex<HashMap<AttemptKey, ActiveAttempt>>,
    next_attempt: AtomicU64,
}

impl AuthorizationWindowController {
    /// Creates a builder with the required collaborators.
    pub fn builder(
        exchange: Arc<dyn CredentialExchange>,
        platform: Arc<dyn BrowsingPlatform>,
        session: SessionContext,
    ) -> ControllerBuilder {
        ControllerBuilder {
            exchange,
            platform,
            session,
            connections: None,
            events: None,
            reporter: None,
            config: ControllerConfig::default(),
        }
    }

    /// Returns the connection store.
    pub fn connections(&self) -> &ConnectionStore {
        &self.connections
    }

    /// Returns the session context.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Returns the timing configuration.
    pub fn config(&self) -> ControllerConfig {
        self.config
    }

    /// Returns the state of `provider` for the current identity.
    pub async fn state(&self, provider: ProviderKind) -> ConnectionState {
        let identity = self.session.identity().await;
        self.connections.state(provider, &identity).await
    }

    /// Number of attempts currently in flight.
    pub fn active_attempts(&self) -> usize {
        self.attempts().len()
    }

    /// Returns true once [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.lifecycle.is_cancelled()
    }

    // ========================================================================
    // Connect
    // ========================================================================

    /// Runs one connection attempt for `provider` under the current identity.
    ///
    /// Returns [`ConnectOutcome::Suppressed`] without doing anything if the
    /// pair is already `Connecting` or `Connected`.
    #[instrument(skip(self))]
    pub async fn connect(&self, provider: ProviderKind) -> ConnectOutcome {
        if self.is_shut_down() {
            debug!("Controller shut down, ignoring connect");
            return ConnectOutcome::Aborted;
        }

        let identity = self.session.identity().await;
        let scope = EventScope::new(provider, &identity);
        self.events.record(&scope.info(EventAction::ConnectRequested));

        let Some(descriptor) = ProviderRegistry::get(provider) else {
            let error = ConnectError::UnknownProvider(provider.cli_name().to_string());
            self.fail(&scope, &error, None);
            return ConnectOutcome::Failed(error);
        };

        let ticket = match self.connections.try_begin(provider, &identity).await {
            Ok(ticket) => ticket,
            Err(state) => return ConnectOutcome::Suppressed(state),
        };

        let started = Instant::now();
        let mut attempt = self.register(ticket);
        let settle = self.run(&mut attempt, descriptor, &scope).await;
        attempt.close_window();
        self.settle(attempt, settle, &scope, started).await
    }

    /// Steps 2 to 5 of an attempt.
    async fn run(
        &self,
        attempt: &mut AttemptGuard<'_>,
        descriptor: &ProviderDescriptor,
        scope: &EventScope,
    ) -> Settle {
        let token = attempt.token.clone();
        let provider = descriptor.id;
        let identity = &scope.identity;

        let requested = tokio::select! {
            biased;
            () = token.cancelled() => return Settle::Aborted,
            result = self.exchange.request_authorization_url(provider, identity) => result,
        };
        let url = match requested {
            Ok(url) => url,
            Err(e) => return Settle::Failed(ConnectError::authorization(&e)),
        };
        self.events.record(
            &scope
                .info(EventAction::AuthorizationUrlObtained)
                .detail("host", url.host().unwrap_or_default()),
        );

        let Some(handle) = self
            .platform
            .open(&WindowRequest::new(&url, descriptor.window_title()))
        else {
            return Settle::Failed(ConnectError::PopupBlocked);
        };
        attempt.handle = Some(handle);
        self.events.record(
            &scope
                .info(EventAction::WindowOpened)
                .detail("window", handle.id()),
        );

        let consent = self.await_consent(handle, &token, scope);
        match self.config.max_wait {
            Some(limit) => tokio::time::timeout(limit, consent)
                .await
                .unwrap_or_else(|_| {
                    warn!(provider = %provider, limit_secs = limit.as_secs(), "Authorization timed out");
                    Settle::Failed(ConnectError::TimedOut(limit))
                }),
            None => consent.await,
        }
    }

    /// Steps 4 and 5: wait for the window to close, then redeem.
    async fn await_consent(
        &self,
        handle: WindowHandle,
        token: &CancellationToken,
        scope: &EventScope,
    ) -> Settle {
        if !self.watch_closure(handle, token).await {
            return Settle::Aborted;
        }
        self.events.record(&scope.info(EventAction::WindowClosed));

        let redeemed = tokio::select! {
            biased;
            () = token.cancelled() => return Settle::Aborted,
            result = self.exchange.redeem_credentials(scope.provider, &scope.identity) => result,
        };
        match redeemed {
            Ok(Redemption::Credentials(credentials)) => Settle::Connected(credentials),
            Ok(Redemption::NoCredentialsYet) => Settle::NoCredentials,
            Err(e) => Settle::Failed(ConnectError::redemption(&e)),
        }
    }

    /// Polls the window until it is closed (true) or `token` fires (false).
    ///
    /// The first check happens one interval after the window opened.
    async fn watch_closure(&self, handle: WindowHandle, token: &CancellationToken) -> bool {
        let period = self.config.poll_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!(window = handle.id(), "Closure detection cancelled");
                    return false;
                }
                _ = ticker.tick() => {
                    if self.platform.is_closed(handle) {
                        debug!(window = handle.id(), "Authorization window closed");
                        return true;
                    }
                }
            }
        }
    }

    /// Applies the attempt's end to the store, session, events and reporter.
    async fn settle(
        &self,
        mut attempt: AttemptGuard<'_>,
        settle: Settle,
        scope: &EventScope,
        started: Instant,
    ) -> ConnectOutcome {
        let Some(ticket) = attempt.ticket.clone() else {
            return ConnectOutcome::Aborted;
        };
        let elapsed_ms = started.elapsed().as_millis();

        let settle = match settle {
            Settle::Connected(_) if attempt.token.is_cancelled() => Settle::Aborted,
            other => other,
        };

        let outcome = match settle {
            Settle::Connected(credentials) => {
                // Credentials reach the session before the pair is marked
                // `Connected`, so a `Connected` pair always has them.
                let handover = self
                    .session
                    .accept_credentials(scope.provider, ticket.identity(), credentials)
                    .await;
                if !handover.is_held() {
                    self.connections.mark_disconnected(&ticket).await;
                    self.cancelled(scope, "stale_identity", elapsed_ms);
                    ConnectOutcome::Aborted
                } else if self.connections.mark_connected(&ticket).await {
                    self.events.record(
                        &scope
                            .info(EventAction::CredentialsObtained)
                            .detail("duration_ms", elapsed_ms)
                            .detail("accepted", handover == Handover::Accepted),
                    );
                    self.reporter.report_success(scope.provider, ticket.identity());
                    info!(provider = %scope.provider, identity = %scope.identity, "Connected");
                    ConnectOutcome::Connected
                } else {
                    self.cancelled(scope, "superseded", elapsed_ms);
                    ConnectOutcome::Aborted
                }
            }
            Settle::NoCredentials => {
                self.connections.mark_disconnected(&ticket).await;
                self.cancelled(scope, "no_credentials", elapsed_ms);
                ConnectOutcome::NoCredentials
            }
            Settle::Failed(error) => {
                self.connections.mark_disconnected(&ticket).await;
                self.fail(scope, &error, Some(elapsed_ms));
                ConnectOutcome::Failed(error)
            }
            Settle::Aborted => {
                self.connections.mark_disconnected(&ticket).await;
                self.cancelled(scope, "aborted", elapsed_ms);
                ConnectOutcome::Aborted
            }
        };

        attempt.disarm();
        outcome
    }

    fn cancelled(&self, scope: &EventScope, reason: &str, elapsed_ms: u128) {
        self.events.record(
            &scope
                .info(EventAction::ConnectionCancelled)
                .detail("reason", reason)
                .detail("duration_ms", elapsed_ms),
        );
    }

    fn fail(&self, scope: &EventScope, error: &ConnectError, elapsed_ms: Option<u128>) {
        let mut event = scope
            .event(EventLevel::Error, EventAction::ConnectionFailed)
            .detail("error", error)
            .detail("kind", error.kind());
        if let Some(status) = error.status() {
            event = event.detail("status", status);
        }
        if let Some(ms) = elapsed_ms {
            event = event.detail("duration_ms", ms);
        }
        self.events.record(&event);
        self.reporter.report_error(scope.provider, &scope.identity, error);
    }

    // ========================================================================
    // Cancellation
    // ========================================================================

    /// Cancels the in-flight attempt for `provider` under the current identity.
    ///
    /// Returns false if there was none.
    pub async fn cancel(&self, provider: ProviderKind) -> bool {
        let identity = self.session.identity().await;
        let token = self
            .attempts()
            .get(&(provider, identity))
            .map(|a| a.token.clone());
        match token {
            Some(token) => {
                debug!(provider = %provider, "Cancelling attempt");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancels every in-flight attempt of `identity`, returning how many
    /// there were. Other identities' attempts keep running.
    pub fn cancel_identity(&self, identity: &SessionIdentity) -> usize {
        let attempts = self.attempts();
        attempts
            .iter()
            .filter(|((_, id), _)| id == identity)
            .inspect(|(_, attempt)| attempt.token.cancel())
            .count()
    }

    /// Switches the session to `identity`.
    ///
    /// Cancels the previous identity's in-flight attempts, forces its pairs
    /// back to `Disconnected` and drops its credentials.
    #[instrument(skip(self), fields(identity = %identity))]
    pub async fn reset_session(&self, identity: SessionIdentity) {
        let previous = self.session.set_identity(identity.clone()).await;
        let cancelled = self.cancel_identity(&previous);
        let reset = self.connections.reset_identity(&previous).await;
        let cleared = self.session.clear_identity(&previous).await;

        self.events.record(
            &LifecycleEvent::info("SessionContext", EventAction::SessionReset)
                .detail("previous_user_id", &previous.user)
                .detail("previous_org_id", &previous.org)
                .detail("user_id", &identity.user)
                .detail("org_id", &identity.org)
                .detail("cancelled", cancelled)
                .detail("reset", reset.len())
                .detail("cleared", cleared),
        );
    }

    /// Stops every attempt and refuses new ones.
    pub fn shutdown(&self) {
        if !self.lifecycle.is_cancelled() {
            info!(active = self.active_attempts(), "Connection controller shutting down");
            self.lifecycle.cancel();
        }
    }

    // ========================================================================
    // Attempt Bookkeeping
    // ========================================================================

    fn attempts(&self) -> MutexGuard<'_, HashMap<AttemptKey, ActiveAttempt>> {
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, ticket: AttemptTicket) -> AttemptGuard<'_> {
        let id = self.next_attempt.fetch_add(1, Ordering::Relaxed);
        let token = self.lifecycle.child_token();
        let key = (ticket.provider(), ticket.identity().clone());
        self.attempts().insert(
            key.clone(),
            ActiveAttempt {
                id,
                token: token.clone(),
            },
        );

        AttemptGuard {
            controller: self,
            key,
            id,
            token,
            ticket: Some(ticket),
            handle: None,
        }
    }

    fn release(&self, key: &AttemptKey, id: u64) {
        let mut attempts = self.attempts();
        if attempts.get(key).is_some_and(|a| a.id == id) {
            attempts.remove(key);
        }
    }
}

impl Drop for AuthorizationWindowController {
    fn drop(&mut self) {
        self.lifecycle.cancel();
    }
}

impl std::fmt::Debug for AuthorizationWindowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationWindowController")
            .field("config", &self.config)
            .field("active_attempts", &self.active_attempts())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Attempt Guard
// ============================================================================

/// Owns one attempt's token, window and ticket.
///
/// Dropping the guard cancels the token, closes the window and unregisters
/// the attempt. If the `connect` future is dropped before the attempt
/// settled, the pair is moved back to `Disconnected` on the runtime.
struct AttemptGuard<'a> {
    controller: &'a AuthorizationWindowController,
    key: AttemptKey,
    id: u64,
    token: CancellationToken,
    ticket: Option<AttemptTicket>,
    handle: Option<WindowHandle>,
}

impl AttemptGuard<'_> {
    fn close_window(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.controller.platform.close(handle);
        }
    }

    fn disarm(&mut self) {
        self.ticket = None;
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        self.token.cancel();
        self.controller.release(&self.key, self.id);
        self.close_window();

        if let Some(ticket) = self.ticket.take() {
            let connections = self.controller.connections.clone();
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    runtime.spawn(async move {
                        connections.mark_disconnected(&ticket).await;
                    });
                }
                Err(_) => warn!(provider = %ticket.provider(), "Attempt dropped outside a runtime"),
            }
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`AuthorizationWindowController`].
pub struct ControllerBuilder {
    exchange: Arc<dyn CredentialExchange>,
    platform: Arc<dyn BrowsingPlatform>,
    session: SessionContext,
    connections: Option<ConnectionStore>,
    events: Option<Arc<dyn EventSink>>,
    reporter: Option<Arc<dyn ConnectReporter>>,
    config: ControllerConfig,
}

impl ControllerBuilder {
    /// Shares an existing connection store.
    #[must_use]
    pub fn connections(mut self, connections: ConnectionStore) -> Self {
        self.connections = Some(connections);
        self
    }

    /// Sends lifecycle events to `events` (default: tracing).
    #[must_use]
    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    /// Reports outcomes to `reporter` (default: tracing).
    #[must_use]
    pub fn reporter(mut self, reporter: Arc<dyn ConnectReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Sets the timing configuration.
    #[must_use]
    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the controller.
    pub fn build(self) -> AuthorizationWindowController {
        AuthorizationWindowController {
            exchange: self.exchange,
            platform: self.platform,
            connections: self.connections.unwrap_or_default(),
            session: self.session,
            events: self.events.unwrap_or_else(|| Arc::new(TracingSink)),
            reporter: self.reporter.unwrap_or_else(|| Arc::new(TracingReporter)),
            config: self.config,
            lifecycle: CancellationToken::new(),
            attempts: Mutex::new(HashMap::new()),
            next_attempt: AtomicU64::new(1),
        }
    }
}
