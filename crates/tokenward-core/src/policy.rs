//! Where a credential is persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The caller's "remember me" choice, made at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistencePolicy {
    /// Survives restarts.
    Durable,
    /// Scoped to the current session only.
    Ephemeral,
}

impl PersistencePolicy {
    /// Map a "remember me" flag to a policy.
    pub fn from_remember(remember: bool) -> Self {
        if remember {
            PersistencePolicy::Durable
        } else {
            PersistencePolicy::Ephemeral
        }
    }

    /// The policy naming the other backend.
    pub fn other(self) -> Self {
        match self {
            PersistencePolicy::Durable => PersistencePolicy::Ephemeral,
            PersistencePolicy::Ephemeral => PersistencePolicy::Durable,
        }
    }
}

impl fmt::Display for PersistencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistencePolicy::Durable => f.write_str("durable"),
            PersistencePolicy::Ephemeral => f.write_str("ephemeral"),
        }
    }
}
