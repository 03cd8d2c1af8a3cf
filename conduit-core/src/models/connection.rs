//! Connection state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// State of one (provider, identity) connection.
///
/// ```text
/// Disconnected ──connect──▶ Connecting ──credentials──▶ Connected
///       ▲                        │                         │
///       └──failure / no creds────┘                         │
///       └──────────────────────reset───────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection and no attempt in flight.
    #[default]
    Disconnected,
    /// An attempt is in flight.
    Connecting,
    /// Credentials were obtained and handed to the session.
    Connected,
}

impl ConnectionState {
    /// Returns true if a new connection attempt may start from this state.
    pub fn accepts_connect(&self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// Returns true if this is the connected state.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
        }
    }
}
