//! Commits — the unit of work submitted to a CRV gate.
//!
//! A commit is a proposed state change or tool output, constructed fresh for
//! each validation call and discarded afterwards. `previous_state` carries
//! the prior value when a validator needs to check backward compatibility.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who proposed the commit and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMetadata {
    pub actor: String,
    pub reason: String,
}

/// A proposed state change or tool output under validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    /// The value under validation.
    pub data: Value,
    /// Prior value, for backward-compatibility validators.
    pub previous_state: Option<Value>,
    /// Logical key the commit targets (state path, tool name, ...).
    pub key: String,
    pub metadata: CommitMetadata,
}

impl Commit {
    pub fn new(
        id: impl Into<String>,
        key: impl Into<String>,
        data: Value,
        actor: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            data,
            previous_state: None,
            key: key.into(),
            metadata: CommitMetadata {
                actor: actor.into(),
                reason: reason.into(),
            },
        }
    }

    pub fn with_previous_state(mut self, previous: Value) -> Self {
        self.previous_state = Some(previous);
        self
    }
}
