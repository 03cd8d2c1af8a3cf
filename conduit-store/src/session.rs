//! Session context.
//!
//! Holds the ambient identity the connection flow runs under and the
//! credentials handed over once a provider is connected. Downstream consumers
//! (data loading) read credentials from here, or subscribe to be told when a
//! handover happens.

use conduit_core::{Credentials, ProviderKind, SessionIdentity};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info};

const UPDATE_CHANNEL_CAPACITY: usize = 16;

/// Result of offering credentials to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handover {
    /// Stored; subscribers were notified.
    Accepted,
    /// The pair already holds credentials; the offered ones were dropped.
    AlreadyHeld,
    /// The identity is no longer current; nothing was stored.
    StaleIdentity,
}

impl Handover {
    /// Returns true if the session holds credentials for the pair afterwards.
    pub fn is_held(self) -> bool {
        !matches!(self, Self::StaleIdentity)
    }
}

/// One credentials handover.
#[derive(Debug, Clone)]
pub struct CredentialsUpdate {
    /// Provider that was connected.
    pub provider: ProviderKind,
    /// Identity the credentials belong to.
    pub identity: SessionIdentity,
    /// The credentials.
    pub credentials: Credentials,
}

struct Inner {
    identity: SessionIdentity,
    credentials: HashMap<(SessionIdentity, ProviderKind), Credentials>,
}

/// Shared session state.
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<RwLock<Inner>>,
    updates: broadcast::Sender<CredentialsUpdate>,
}

impl SessionContext {
    /// Creates a session for `identity` with no credentials.
    pub fn new(identity: SessionIdentity) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(RwLock::new(Inner {
                identity,
                credentials: HashMap::new(),
            })),
            updates,
        }
    }

    /// Returns the current identity.
    pub async fn identity(&self) -> SessionIdentity {
        self.inner.read().await.identity.clone()
    }

    /// Replaces the identity, returning the previous one.
    ///
    /// Credentials already handed over are kept under their own identity.
    pub async fn set_identity(&self, identity: SessionIdentity) -> SessionIdentity {
        let mut inner = self.inner.write().await;
        debug!(from = %inner.identity, to = %identity, "Session identity changed");
        std::mem::replace(&mut inner.identity, identity)
    }

    /// Returns the credentials for `provider` under the current identity.
    pub async fn credentials(&self, provider: ProviderKind) -> Option<Credentials> {
        let inner = self.inner.read().await;
        inner
            .credentials
            .get(&(inner.identity.clone(), provider))
            .cloned()
    }

    /// Returns the providers with credentials under the current identity.
    pub async fn connected_providers(&self) -> Vec<ProviderKind> {
        let inner = self.inner.read().await;
        let mut providers: Vec<_> = inner
            .credentials
            .keys()
            .filter(|(id, _)| *id == inner.identity)
            .map(|(_, p)| *p)
            .collect();
        providers.sort();
        providers
    }

    /// Accepts a credentials handover.
    ///
    /// The first credentials for a (provider, identity) pair win. Handovers
    /// for an identity that is no longer current are refused. Subscribers get
    /// exactly one update per accepted handover.
    pub async fn accept_credentials(
        &self,
        provider: ProviderKind,
        identity: &SessionIdentity,
        credentials: Credentials,
    ) -> Handover {
        {
            let mut inner = self.inner.write().await;
            if inner.identity != *identity {
                debug!(provider = ?provider, identity = %identity, "Identity no longer current, ignoring");
                return Handover::StaleIdentity;
            }
            let key = (identity.clone(), provider);
            if inner.credentials.contains_key(&key) {
                debug!(provider = ?provider, identity = %identity, "Credentials already held, ignoring");
                return Handover::AlreadyHeld;
            }
            inner.credentials.insert(key, credentials.clone());
        }

        info!(provider = ?provider, identity = %identity, "Credentials accepted");
        // No subscribers is fine.
        let _ = self.updates.send(CredentialsUpdate {
            provider,
            identity: identity.clone(),
            credentials,
        });
        Handover::Accepted
    }

    /// Drops every credential held for `identity`.
    pub async fn clear_identity(&self, identity: &SessionIdentity) -> usize {
        let mut inner = self.inner.write().await;
        let before = inner.credentials.len();
        inner.credentials.retain(|(id, _), _| id != identity);
        before - inner.credentials.len()
    }

    /// Subscribes to credentials handovers.
    pub fn subscribe(&self) -> broadcast::Receiver<CredentialsUpdate> {
        self.updates.subscribe()
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn creds(token: &str) -> Credentials {
        Credentials::from_payload(json!({"access_token": token})).unwrap()
    }

    #[tokio::test]
    async fn test_first_credentials_win() {
        let session = SessionContext::new(SessionIdentity::new("u", "o"));
        let id = session.identity().await;
        let mut rx = session.subscribe();

        assert_eq!(
            session.accept_credentials(ProviderKind::HubSpot, &id, creds("a")).await,
            Handover::Accepted
        );
        assert_eq!(
            session.accept_credentials(ProviderKind::HubSpot, &id, creds("b")).await,
            Handover::AlreadyHeld
        );

        assert_eq!(session.credentials(ProviderKind::HubSpot).await, Some(creds("a")));
        assert_eq!(rx.recv().await.unwrap().credentials, creds("a"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_credentials_follow_identity() {
        let alice = SessionIdentity::new("alice", "o");
        let bob = SessionIdentity::new("bob", "o");
        let session = SessionContext::new(alice.clone());

        session.accept_credentials(ProviderKind::Notion, &alice, creds("a")).await;
        let previous = session.set_identity(bob.clone()).await;
        assert_eq!(previous, alice);
        assert!(session.credentials(ProviderKind::Notion).await.is_none());
        assert!(session.connected_providers().await.is_empty());

        assert_eq!(session.clear_identity(&alice).await, 1);
    }

    #[tokio::test]
    async fn test_stale_identity_handover_refused() {
        let alice = SessionIdentity::new("alice", "o");
        let session = SessionContext::new(alice.clone());
        session.set_identity(SessionIdentity::new("bob", "o")).await;

        let handover = session.accept_credentials(ProviderKind::Airtable, &alice, creds("a")).await;
        assert_eq!(handover, Handover::StaleIdentity);
        assert!(!handover.is_held());
        assert_eq!(session.clear_identity(&alice).await, 0);
    }
}
