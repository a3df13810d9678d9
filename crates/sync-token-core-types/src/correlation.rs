//! Correlation types for sync pass tracking
//!
//! Every notification the router handles runs as one "sync pass". The pass
//! id is attached to every log line the pass emits so that the prototype
//! write and the scene batch of one change can be tied together.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a single sync pass
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PassId(String);

impl PassId {
    /// Generate a new random PassId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for PassId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context carried through one notification's handling
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub pass_id: PassId,
    /// User whose action triggered the notification
    pub user_id: String,
}

impl RequestContext {
    /// Create a new context with a fresh PassId
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            pass_id: PassId::new(),
            user_id: user_id.into(),
        }
    }

    /// Create a context with an existing PassId
    pub fn with_pass_id(pass_id: PassId, user_id: impl Into<String>) -> Self {
        Self {
            pass_id,
            user_id: user_id.into(),
        }
    }
}
