//! Connection state machine.
//!
//! One [`ConnectionState`] per (provider, identity) pair:
//!
//! ```text
//! Disconnected ──try_begin──▶ Connecting ──mark_connected──▶ Connected
//!       ▲                         │                              │
//!       └────mark_disconnected────┘                              │
//!       └──────────────────────reset_identity────────────────────┘
//! ```
//!
//! [`ConnectionStore::try_begin`] is the mutual-exclusion point: only one
//! caller can move a pair out of `Disconnected`, and it gets back an
//! [`AttemptTicket`]. Completing transitions require a ticket whose generation
//! still matches the entry, so a reset makes every outstanding ticket stale.

use conduit_core::{ConnectionState, ProviderKind, SessionIdentity};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info};

/// Capacity of the state-change broadcast channel.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

// ============================================================================
// Types
// ============================================================================

/// Proof that the holder moved a pair into `Connecting`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptTicket {
    provider: ProviderKind,
    identity: SessionIdentity,
    generation: u64,
}

impl AttemptTicket {
    /// Provider the attempt is for.
    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Identity the attempt is for.
    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    /// Generation the ticket was issued at.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A state transition, broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    /// Provider.
    pub provider: ProviderKind,
    /// Identity.
    pub identity: SessionIdentity,
    /// Previous state.
    pub from: ConnectionState,
    /// New state.
    pub to: ConnectionState,
}

#[derive(Debug, Default)]
struct Entry {
    state: ConnectionState,
    generation: u64,
}

type Key = (ProviderKind, SessionIdentity);

// ============================================================================
// Connection Store
// ============================================================================

/// Per-(provider, identity) connection states.
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct ConnectionStore {
    entries: Arc<RwLock<HashMap<Key, Entry>>>,
    changes: broadcast::Sender<StateChange>,
}

impl Default for ConnectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionStore {
    /// Creates an empty store; every pair starts `Disconnected`.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            changes,
        }
    }

    /// Returns the state of a pair.
    pub async fn state(&self, provider: ProviderKind, identity: &SessionIdentity) -> ConnectionState {
        self.entries
            .read()
            .await
            .get(&(provider, identity.clone()))
            .map(|e| e.state)
            .unwrap_or_default()
    }

    /// Moves a pair from `Disconnected` to `Connecting`.
    ///
    /// Returns the current state instead if the pair is already `Connecting`
    /// or `Connected`; nothing changes in that case.
    pub async fn try_begin(
        &self,
        provider: ProviderKind,
        identity: &SessionIdentity,
    ) -> Result<AttemptTicket, ConnectionState> {
        let generation = {
            let mut entries = self.entries.write().await;
            let entry = entries.entry((provider, identity.clone())).or_default();
            if !entry.state.accepts_connect() {
                debug!(provider = ?provider, identity = %identity, state = %entry.state, "Connect suppressed");
                return Err(entry.state);
            }
            entry.state = ConnectionState::Connecting;
            entry.generation += 1;
            entry.generation
        };

        self.publish(provider, identity, ConnectionState::Disconnected, ConnectionState::Connecting);
        Ok(AttemptTicket {
            provider,
            identity: identity.clone(),
            generation,
        })
    }

    /// Completes an attempt: `Connecting` to `Connected`.
    ///
    /// Returns false (and changes nothing) if the ticket is stale.
    pub async fn mark_connected(&self, ticket: &AttemptTicket) -> bool {
        self.finish(ticket, ConnectionState::Connected).await
    }

    /// Abandons an attempt: `Connecting` to `Disconnected`.
    ///
    /// Returns false (and changes nothing) if the ticket is stale.
    pub async fn mark_disconnected(&self, ticket: &AttemptTicket) -> bool {
        self.finish(ticket, ConnectionState::Disconnected).await
    }

    async fn finish(&self, ticket: &AttemptTicket, to: ConnectionState) -> bool {
        {
            let mut entries = self.entries.write().await;
            let Some(entry) = entries.get_mut(&(ticket.provider, ticket.identity.clone())) else {
                return false;
            };
            if entry.generation != ticket.generation || entry.state != ConnectionState::Connecting {
                debug!(
                    provider = ?ticket.provider,
                    ticket = ticket.generation,
                    current = entry.generation,
                    "Stale attempt ticket ignored"
                );
                return false;
            }
            entry.state = to;
        }

        self.publish(ticket.provider, &ticket.identity, ConnectionState::Connecting, to);
        true
    }

    /// Forces every pair of `identity` back to `Disconnected`.
    ///
    /// Outstanding tickets for the identity become stale. Returns the
    /// providers whose state changed.
    pub async fn reset_identity(&self, identity: &SessionIdentity) -> Vec<ProviderKind> {
        let changed: Vec<(ProviderKind, ConnectionState)> = {
            let mut entries = self.entries.write().await;
            entries
                .iter_mut()
                .filter(|((_, id), _)| id == identity)
                .filter_map(|((provider, _), entry)| {
                    entry.generation += 1;
                    let from = std::mem::take(&mut entry.state);
                    (from != ConnectionState::Disconnected).then_some((*provider, from))
                })
                .collect()
        };

        for (provider, from) in &changed {
            self.publish(*provider, identity, *from, ConnectionState::Disconnected);
        }
        if !changed.is_empty() {
            info!(identity = %identity, count = changed.len(), "Connections reset");
        }
        changed.into_iter().map(|(p, _)| p).collect()
    }

    /// Subscribes to state transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.changes.subscribe()
    }

    fn publish(
        &self,
        provider: ProviderKind,
        identity: &SessionIdentity,
        from: ConnectionState,
        to: ConnectionState,
    ) {
        debug!(provider = ?provider, identity = %identity, %from, %to, "Connection state changed");
        // No subscribers is fine.
        let _ = self.changes.send(StateChange {
            provider,
            identity: identity.clone(),
            from,
            to,
        });
    }
}

// ============================================================================
// Tests
// ============================================================================
