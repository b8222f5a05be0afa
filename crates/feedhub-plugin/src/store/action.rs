//! Actions dispatched through the state store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Action used to seed every slice when the store is created.
pub const INIT_ACTION: &str = "@@store/INIT";

/// Action used to seed new slices after the reducer set changes.
pub const REPLACE_ACTION: &str = "@@store/REPLACE";

/// A state transition request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Action type, e.g. `"posts/add"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Arbitrary payload.
    #[serde(default)]
    pub payload: Value,
}

impl Action {
    /// Creates an action without a payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Value::Null,
        }
    }

    /// Sets the payload.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}
