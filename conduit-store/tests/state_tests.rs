//! Integration tests for the connection state machine and session handover.

use conduit_core::{ConnectionState, Credentials, ProviderKind, SessionIdentity};
use conduit_store::{ConnectionStore, SessionContext};
use serde_json::json;

#[tokio::test]
async fn test_concurrent_begins_admit_exactly_one() {
    let store = ConnectionStore::new();
    let identity = SessionIdentity::new("TestUser", "TestOrg");

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let store = store.clone();
            let identity = identity.clone();
            tokio::spawn(async move { store.try_begin(ProviderKind::HubSpot, &identity).await.is_ok() })
        })
        .collect();

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 1);
    assert_eq!(
        store.state(ProviderKind::HubSpot, &identity).await,
        ConnectionState::Connecting
    );
}

#[tokio::test]
async fn test_failed_attempt_is_retriable() {
    let store = ConnectionStore::new();
    let identity = SessionIdentity::new("TestUser", "TestOrg");

    let ticket = store.try_begin(ProviderKind::Notion, &identity).await.unwrap();
    assert!(store.mark_disconnected(&ticket).await);

    let retry = store.try_begin(ProviderKind::Notion, &identity).await.unwrap();
    assert!(retry.generation() > ticket.generation());
}

#[tokio::test]
async fn test_identity_switch_leaves_old_credentials_unreachable() {
    let alice = SessionIdentity::new("alice", "acme");
    let session = SessionContext::new(alice.clone());
    let creds = Credentials::from_payload(json!({"access_token": "a"})).unwrap();

    session
        .accept_credentials(ProviderKind::HubSpot, &alice, creds)
        .await;
    assert_eq!(session.connected_providers().await, vec![ProviderKind::HubSpot]);

    session.set_identity(SessionIdentity::new("bob", "acme")).await;
    assert!(session.credentials(ProviderKind::HubSpot).await.is_none());
}
