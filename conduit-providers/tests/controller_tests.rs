//! Connection flow tests against scripted exchange and platform doubles.
//!
//! All tests run on a paused clock, so poll intervals and timeouts elapse
//! instantly and deterministically.

mod common;

use std::time::Duration;

use conduit_core::{ConnectionState, EventAction, ProviderKind, SessionIdentity};
use conduit_fetch::ExchangeError;
use conduit_providers::{ConnectError, ConnectOutcome, ControllerConfig, Redemption, Report};
use futures::future::join_all;

use common::{FakeExchange, FakePlatform, Harness, credentials, identity};

const HUBSPOT: ProviderKind = ProviderKind::HubSpot;

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_successful_connect() {
    let h = Harness::new(FakeExchange::new(), FakePlatform::closing_after(3));

    let outcome = h.controller.connect(HUBSPOT).await;

    assert_eq!(outcome, ConnectOutcome::Connected);
    assert_eq!(h.controller.state(HUBSPOT).await, ConnectionState::Connected);
    assert_eq!(h.session.credentials(HUBSPOT).await, Some(credentials()));
    assert_eq!(h.reporter.reports(), vec![Report::Success(HUBSPOT)]);
    assert_eq!(h.platform.titles(), vec!["HubSpot Authorization".to_string()]);
    assert_eq!(h.platform.polls(), 3);
    assert_eq!(h.platform.closes(), 1);
    assert_eq!(h.controller.active_attempts(), 0);

    assert_eq!(
        h.events.actions(),
        vec![
            EventAction::ConnectRequested,
            EventAction::AuthorizationUrlObtained,
            EventAction::WindowOpened,
            EventAction::WindowClosed,
            EventAction::CredentialsObtained,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_events_carry_identity_but_not_url_query() {
    let h = Harness::new(FakeExchange::new(), FakePlatform::closing_after(1));

    h.controller.connect(HUBSPOT).await;

    let events = h.events.events();
    let obtained = events
        .iter()
        .find(|e| e.action == EventAction::AuthorizationUrlObtained)
        .unwrap();
    assert_eq!(obtained.get("host"), Some("app.hubspot.com"));
    assert_eq!(obtained.get("user_id"), Some("TestUser"));
    assert_eq!(obtained.get("org_id"), Some("TestOrg"));
    assert_eq!(obtained.component, "HubSpotIntegration");

    for event in &events {
        for value in event.details.values() {
            assert!(!value.contains("state=abc"), "query leaked in {:?}", event.action);
            assert!(!value.contains("tok"), "credentials leaked in {:?}", event.action);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_consent_is_silent_and_retriable() {
    let h = Harness::new(FakeExchange::new(), FakePlatform::closing_after(2));
    h.exchange.set_redeem(Ok(Redemption::NoCredentialsYet));

    let outcome = h.controller.connect(HUBSPOT).await;

    assert_eq!(outcome, ConnectOutcome::NoCredentials);
    assert_eq!(h.controller.state(HUBSPOT).await, ConnectionState::Disconnected);
    assert!(h.reporter.reports().is_empty());
    assert_eq!(h.session.credentials(HUBSPOT).await, None);
    assert_eq!(h.events.count(EventAction::ConnectionCancelled), 1);

    h.exchange.set_redeem(Ok(Redemption::Credentials(credentials())));
    assert_eq!(h.controller.connect(HUBSPOT).await, ConnectOutcome::Connected);
    assert_eq!(h.exchange.authorize_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_redemption_failure_reported_once() {
    let h = Harness::new(FakeExchange::new(), FakePlatform::closing_after(1));
    h.exchange.set_redeem(Err(ExchangeError::CredentialRedemptionFailed {
        status: Some(400),
        detail: "No credentials found.".to_string(),
    }));

    let outcome = h.controller.connect(HUBSPOT).await;

    let expected = ConnectError::CredentialRedemptionFailed {
        status: Some(400),
        detail: "No credentials found.".to_string(),
    };
    assert_eq!(outcome, ConnectOutcome::Failed(expected.clone()));
    assert_eq!(h.reporter.errors(), vec![expected]);
    assert_eq!(h.reporter.success_count(), 0);
    assert_eq!(h.controller.state(HUBSPOT).await, ConnectionState::Disconnected);

    let failed = h
        .events
        .events()
        .into_iter()
        .find(|e| e.action == EventAction::ConnectionFailed)
        .unwrap();
    assert_eq!(failed.get("status"), Some("400"));
    assert_eq!(failed.get("kind"), Some("credential_redemption_failed"));
}

#[tokio::test(start_paused = true)]
async fn test_authorization_failure_opens_no_window() {
    let h = Harness::new(
        FakeExchange::new().failing_authorize(500, "Internal Server Error"),
        FakePlatform::closing_after(1),
    );

    let outcome = h.controller.connect(HUBSPOT).await;

    assert!(matches!(
        outcome,
        ConnectOutcome::Failed(ConnectError::AuthorizationRequestFailed { status: Some(500), .. })
    ));
    assert_eq!(h.platform.opens(), 0);
    assert_eq!(h.exchange.redeem_calls(), 0);
    assert_eq!(h.reporter.errors().len(), 1);
    assert_eq!(h.controller.state(HUBSPOT).await, ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_blocked_window_is_reported() {
    let h = Harness::new(FakeExchange::new(), FakePlatform::blocking());

    let outcome = h.controller.connect(HUBSPOT).await;

    assert_eq!(outcome, ConnectOutcome::Failed(ConnectError::PopupBlocked));
    assert_eq!(h.reporter.errors(), vec![ConnectError::PopupBlocked]);
    assert_eq!(h.platform.polls(), 0);
    assert_eq!(h.exchange.redeem_calls(), 0);
    assert_eq!(h.controller.state(HUBSPOT).await, ConnectionState::Disconnected);
}

// ============================================================================
// Suppression
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_connect_while_connecting_is_suppressed() {
    let h = Harness::new(FakeExchange::new(), FakePlatform::never_closing());

    let controller = h.controller.clone();
    let first = tokio::spawn(async move { controller.connect(HUBSPOT).await });
    tokio::time::sleep(Duration::from_secs(1)).await;

    let second = h.controller.connect(HUBSPOT).await;
    assert_eq!(second, ConnectOutcome::Suppressed(ConnectionState::Connecting));
    assert_eq!(h.exchange.authorize_calls(), 1);
    assert_eq!(h.platform.opens(), 1);

    h.platform.close_window();
    assert_eq!(first.await.unwrap(), ConnectOutcome::Connected);
}

#[tokio::test(start_paused = true)]
async fn test_connect_when_connected_is_suppressed() {
    let h = Harness::new(FakeExchange::new(), FakePlatform::closing_after(1));

    assert_eq!(h.controller.connect(HUBSPOT).await, ConnectOutcome::Connected);
    assert_eq!(
        h.controller.connect(HUBSPOT).await,
        ConnectOutcome::Suppressed(ConnectionState::Connected)
    );
    assert_eq!(h.exchange.authorize_calls(), 1);
    assert_eq!(h.reporter.success_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_providers_connect_independently() {
    let h = Harness::new(FakeExchange::new(), FakePlatform::closing_after(2));

    let a = h.controller.clone();
    let n = h.controller.clone();
    let (airtable, notion) = tokio::join!(
        async move { a.connect(ProviderKind::Airtable).await },
        async move { n.connect(ProviderKind::Notion).await },
    );

    assert!(airtable.is_connected());
    assert!(notion.is_connected());
    assert_eq!(h.exchange.authorize_calls(), 2);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_timeout_closes_window() {
    let config = ControllerConfig::default().with_max_wait(Some(Duration::from_secs(2)));
    let h = Harness::with_config(FakeExchange::new(), FakePlatform::never_closing(), config);

    let outcome = h.controller.connect(HUBSPOT).await;

    assert_eq!(
        outcome,
        ConnectOutcome::Failed(ConnectError::TimedOut(Duration::from_secs(2)))
    );
    assert_eq!(h.platform.closes(), 1);
    assert_eq!(h.reporter.errors().len(), 1);
    assert_eq!(h.exchange.redeem_calls(), 0);
    assert_eq!(h.controller.state(HUBSPOT).await, ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_polling() {
    let h = Harness::new(FakeExchange::new(), FakePlatform::never_closing());

    let controller = h.controller.clone();
    let attempt = tokio::spawn(async move { controller.connect(HUBSPOT).await });
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(h.controller.cancel(HUBSPOT).await);
    assert_eq!(attempt.await.unwrap(), ConnectOutcome::Aborted);

    let polls = h.platform.polls();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.platform.polls(), polls);
    assert_eq!(h.platform.closes(), 1);
    assert!(h.reporter.reports().is_empty());
    assert_eq!(h.controller.state(HUBSPOT).await, ConnectionState::Disconnected);
    assert!(!h.controller.cancel(HUBSPOT).await);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_polling_and_refuses_new_attempts() {
    let h = Harness::new(FakeExchange::new(), FakePlatform::never_closing());

    let controller = h.controller.clone();
    let attempt = tokio::spawn(async move { controller.connect(HUBSPOT).await });
    tokio::time::sleep(Duration::from_secs(1)).await;

    h.controller.shutdown();
    assert_eq!(attempt.await.unwrap(), ConnectOutcome::Aborted);

    let polls = h.platform.polls();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.platform.polls(), polls);

    assert!(h.controller.is_shut_down());
    assert_eq!(h.controller.connect(HUBSPOT).await, ConnectOutcome::Aborted);
    assert_eq!(h.exchange.authorize_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_attempt_reverts_state() {
    let h = Harness::new(FakeExchange::new(), FakePlatform::never_closing());

    let controller = h.controller.clone();
    let attempt = tokio::spawn(async move { controller.connect(HUBSPOT).await });
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.controller.state(HUBSPOT).await, ConnectionState::Connecting);

    attempt.abort();
    assert!(attempt.await.unwrap_err().is_cancelled());
    tokio::time::sleep(Duration::from_millis(10)).await;

    let polls = h.platform.polls();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.platform.polls(), polls);
    assert_eq!(h.platform.closes(), 1);
    assert_eq!(h.controller.active_attempts(), 0);
    assert_eq!(h.controller.state(HUBSPOT).await, ConnectionState::Disconnected);
}

// ============================================================================
// Session Reset
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_identity_switch_discards_late_credentials() {
    let h = Harness::new(
        FakeExchange::new().with_delay(Duration::from_secs(3)),
        FakePlatform::closing_after(1),
    );

    let controller = h.controller.clone();
    let attempt = tokio::spawn(async move { controller.connect(HUBSPOT).await });
    // URL arrives at 3s, window closes at 3.2s, redemption would finish at 6.2s.
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(h.exchange.redeem_calls(), 1);

    let next = SessionIdentity::new("OtherUser", "OtherOrg");
    h.controller.reset_session(next.clone()).await;

    assert_eq!(attempt.await.unwrap(), ConnectOutcome::Aborted);
    assert_eq!(h.session.identity().await, next);
    assert_eq!(h.session.credentials(HUBSPOT).await, None);
    assert!(h.session.connected_providers().await.is_empty());
    assert!(h.reporter.reports().is_empty());
    assert_eq!(
        h.controller.connections().state(HUBSPOT, &identity()).await,
        ConnectionState::Disconnected
    );
    assert_eq!(h.events.count(EventAction::SessionReset), 1);
}

#[tokio::test(start_paused = true)]
async fn test_identity_change_during_redemption_aborts() {
    let h = Harness::new(
        FakeExchange::new().with_delay(Duration::from_secs(3)),
        FakePlatform::closing_after(1),
    );

    let controller = h.controller.clone();
    let attempt = tokio::spawn(async move { controller.connect(HUBSPOT).await });
    // Redemption is in flight from 3.2s to 6.2s.
    tokio::time::sleep(Duration::from_secs(4)).await;
    h.session
        .set_identity(SessionIdentity::new("OtherUser", "OtherOrg"))
        .await;

    assert_eq!(attempt.await.unwrap(), ConnectOutcome::Aborted);
    assert!(h.reporter.reports().is_empty());
    assert_eq!(
        h.controller.connections().state(HUBSPOT, &identity()).await,
        ConnectionState::Disconnected
    );
    assert_eq!(h.session.credentials(HUBSPOT).await, None);
    assert!(h.session.connected_providers().await.is_empty());
    assert_eq!(h.events.count(EventAction::CredentialsObtained), 0);

    let cancelled = h
        .events
        .events()
        .into_iter()
        .find(|e| e.action == EventAction::ConnectionCancelled)
        .unwrap();
    assert_eq!(cancelled.get("reason"), Some("stale_identity"));

    // The previous identity can connect again once it is current.
    h.session.set_identity(identity()).await;
    assert!(h.controller.connect(HUBSPOT).await.is_connected());
    assert_eq!(h.session.credentials(HUBSPOT).await, Some(credentials()));
}

#[tokio::test(start_paused = true)]
async fn test_dropped_attempt_never_leaves_connected_without_credentials() {
    for yields in 0..8 {
        let h = Harness::new(
            FakeExchange::new().with_delay(Duration::from_secs(3)),
            FakePlatform::closing_after(1),
        );

        let controller = h.controller.clone();
        let attempt = tokio::spawn(async move { controller.connect(HUBSPOT).await });
        // Redemption completes at 6.2s; drop the attempt somewhere around settling.
        tokio::time::sleep(Duration::from_millis(6200)).await;
        for _ in 0..yields {
            tokio::task::yield_now().await;
        }
        attempt.abort();
        let _ = attempt.await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let state = h.controller.state(HUBSPOT).await;
        let held = h.session.credentials(HUBSPOT).await.is_some();
        assert!(
            state != ConnectionState::Connected || held,
            "after {yields} yields: connected without credentials"
        );
        assert_ne!(state, ConnectionState::Connecting, "after {yields} yields");
        assert_eq!(h.controller.active_attempts(), 0);
    }
}

#[tokio::test(start_paused = true)]
async fn test_reset_session_leaves_other_identities_running() {
    let h = Harness::new(FakeExchange::new(), FakePlatform::never_closing());

    let controller = h.controller.clone();
    let first = tokio::spawn(async move { controller.connect(HUBSPOT).await });
    tokio::time::sleep(Duration::from_secs(1)).await;

    let bob = SessionIdentity::new("bob", "acme");
    h.session.set_identity(bob.clone()).await;
    let controller = h.controller.clone();
    let second = tokio::spawn(async move { controller.connect(HUBSPOT).await });
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.controller.active_attempts(), 2);

    h.controller
        .reset_session(SessionIdentity::new("carol", "acme"))
        .await;

    assert_eq!(second.await.unwrap(), ConnectOutcome::Aborted);
    assert_eq!(
        h.controller.connections().state(HUBSPOT, &bob).await,
        ConnectionState::Disconnected
    );
    assert!(!first.is_finished());
    assert_eq!(h.controller.active_attempts(), 1);
    assert_eq!(
        h.controller.connections().state(HUBSPOT, &identity()).await,
        ConnectionState::Connecting
    );

    let reset = h
        .events
        .events()
        .into_iter()
        .find(|e| e.action == EventAction::SessionReset)
        .unwrap();
    assert_eq!(reset.get("cancelled"), Some("1"));

    h.controller.shutdown();
    assert_eq!(first.await.unwrap(), ConnectOutcome::Aborted);
}

#[tokio::test(start_paused = true)]
async fn test_reset_session_disconnects_previous_identity() {
    let h = Harness::new(FakeExchange::new(), FakePlatform::closing_after(1));
    assert!(h.controller.connect(HUBSPOT).await.is_connected());

    h.controller
        .reset_session(SessionIdentity::new("OtherUser", "OtherOrg"))
        .await;

    assert_eq!(
        h.controller.connections().state(HUBSPOT, &identity()).await,
        ConnectionState::Disconnected
    );
    assert_eq!(h.controller.state(HUBSPOT).await, ConnectionState::Disconnected);
    assert_eq!(h.session.credentials(HUBSPOT).await, None);

    let reset = h
        .events
        .events()
        .into_iter()
        .find(|e| e.action == EventAction::SessionReset)
        .unwrap();
    assert_eq!(reset.get("previous_user_id"), Some("TestUser"));
    assert_eq!(reset.get("user_id"), Some("OtherUser"));

    // The new identity connects with a fresh attempt.
    assert!(h.controller.connect(HUBSPOT).await.is_connected());
    assert_eq!(h.exchange.authorize_calls(), 2);
}

// ============================================================================
// Reference Scenarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_scenario_a_window_never_closes_without_max_wait() {
    let config = ControllerConfig::default().with_max_wait(None);
    let h = Harness::with_config(FakeExchange::new(), FakePlatform::never_closing(), config);

    let controller = h.controller.clone();
    let attempt = tokio::spawn(async move { controller.connect(HUBSPOT).await });
    tokio::time::sleep(Duration::from_secs(3600)).await;

    assert!(!attempt.is_finished());
    assert_eq!(h.controller.state(HUBSPOT).await, ConnectionState::Connecting);
    assert_eq!(h.exchange.redeem_calls(), 0);
    assert!(h.reporter.reports().is_empty());

    h.controller.shutdown();
    assert_eq!(attempt.await.unwrap(), ConnectOutcome::Aborted);
}

#[tokio::test(start_paused = true)]
async fn test_scenario_b_authorize_500_reports_once() {
    let h = Harness::new(
        FakeExchange::new().failing_authorize(500, "boom"),
        FakePlatform::closing_after(1),
    );
    let mut changes = h.controller.connections().subscribe();

    h.controller.connect(HUBSPOT).await;

    let first = changes.recv().await.unwrap();
    let second = changes.recv().await.unwrap();
    assert_eq!(
        (first.from, first.to),
        (ConnectionState::Disconnected, ConnectionState::Connecting)
    );
    assert_eq!(
        (second.from, second.to),
        (ConnectionState::Connecting, ConnectionState::Disconnected)
    );
    assert_eq!(h.reporter.errors().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_scenario_c_single_credentials_update() {
    let h = Harness::new(FakeExchange::new(), FakePlatform::closing_after(2));
    let mut updates = h.session.subscribe();

    assert!(h.controller.connect(HUBSPOT).await.is_connected());

    let update = updates.recv().await.unwrap();
    assert_eq!(update.provider, HUBSPOT);
    assert_eq!(update.identity, identity());
    assert_eq!(update.credentials, credentials());
    assert!(updates.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_scenario_d_rapid_connects_send_one_request() {
    let h = Harness::new(
        FakeExchange::new().with_delay(Duration::from_millis(500)),
        FakePlatform::closing_after(1),
    );

    let outcomes = join_all((0..5).map(|_| h.controller.connect(HUBSPOT))).await;

    assert_eq!(h.exchange.authorize_calls(), 1);
    assert_eq!(h.platform.opens(), 1);
    assert_eq!(outcomes.iter().filter(|o| o.is_connected()).count(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| **o == ConnectOutcome::Suppressed(ConnectionState::Connecting))
            .count(),
        4
    );
}
