//! Opaque credential payloads.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Provider-defined credential payload.
///
/// The payload is kept exactly as the server returned it and is never
/// interpreted by Conduit. `Debug` output is redacted because the payload
/// usually carries access tokens.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(Value);

impl Credentials {
    /// Wraps a payload, returning `None` when it carries no credentials.
    ///
    /// `null`, `false`, the empty string, an empty object and an empty array
    /// all count as "no credentials".
    pub fn from_payload(payload: Value) -> Option<Self> {
        let empty = match &payload {
            Value::Null | Value::Bool(false) => true,
            Value::String(s) => s.is_empty(),
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Bool(true) | Value::Number(_) => false,
        };
        (!empty).then_some(Self(payload))
    }

    /// Returns the raw payload.
    pub fn payload(&self) -> &Value {
        &self.0
    }

    /// Serializes the payload to JSON text for the data endpoint.
    pub fn to_json_string(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials(<redacted>)")
    }
}
