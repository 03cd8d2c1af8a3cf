//! Session identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The (user, organization) pair a connection attempt is scoped to.
///
/// The identity is supplied by the hosting form and is read-only to the
/// connection flow. Empty values are passed through as-is; use
/// [`SessionIdentity::is_complete`] if the caller wants to validate first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionIdentity {
    /// User identifier.
    pub user: String,
    /// Organization identifier.
    pub org: String,
}

impl SessionIdentity {
    /// Creates a new identity.
    pub fn new(user: impl Into<String>, org: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            org: org.into(),
        }
    }

    /// Returns true if both user and org are non-blank.
    pub fn is_complete(&self) -> bool {
        !self.user.trim().is_empty() && !self.org.trim().is_empty()
    }

    /// Form fields sent to the credential endpoints.
    pub fn form_fields(&self) -> [(&'static str, &str); 2] {
        [("user_id", self.user.as_str()), ("org_id", self.org.as_str())]
    }
}

impl fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org, self.user)
    }
}
