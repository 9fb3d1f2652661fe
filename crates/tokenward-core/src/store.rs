//! Dual-backend credential store.
//!
//! Reads prefer the ephemeral backend over the durable one. Every write goes
//! to exactly one backend and removes the key from the other, so a stale copy
//! can never resurface through read precedence.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::Result;
use crate::error::StorageError;
use crate::policy::PersistencePolicy;
use crate::traits::StorageBackend;

/// The keys under which session credentials are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    AccessToken,
    RefreshToken,
    /// The JSON-serialized user profile.
    User,
}

impl CredentialKey {
    /// Every credential key, in the order they are cleared.
    pub const ALL: [CredentialKey; 3] = [
        CredentialKey::AccessToken,
        CredentialKey::RefreshToken,
        CredentialKey::User,
    ];

    /// The storage key string.
    pub fn as_str(self) -> &'static str {
        match self {
            CredentialKey::AccessToken => "accessToken",
            CredentialKey::RefreshToken => "refreshToken",
            CredentialKey::User => "user",
        }
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persists credentials across an ephemeral and a durable backend.
///
/// Cheap to clone; clones share the same backends.
#[derive(Clone)]
pub struct CredentialStore {
    ephemeral: Arc<dyn StorageBackend>,
    durable: Arc<dyn StorageBackend>,
}

impl CredentialStore {
    /// Create a store over the two backends.
    pub fn new(ephemeral: Arc<dyn StorageBackend>, durable: Arc<dyn StorageBackend>) -> Self {
        Self { ephemeral, durable }
    }

    fn backend(&self, policy: PersistencePolicy) -> &dyn StorageBackend {
        match policy {
            PersistencePolicy::Ephemeral => self.ephemeral.as_ref(),
            PersistencePolicy::Durable => self.durable.as_ref(),
        }
    }

    /// Read a key, ephemeral backend first.
    pub fn read(&self, key: CredentialKey) -> Result<Option<String>> {
        if let Some(value) = self.ephemeral.get(key.as_str())? {
            return Ok(Some(value));
        }
        self.durable.get(key.as_str())
    }

    /// Which backend currently holds `key`, ephemeral checked first.
    pub fn holder(&self, key: CredentialKey) -> Result<Option<PersistencePolicy>> {
        if self.ephemeral.get(key.as_str())?.is_some() {
            Ok(Some(PersistencePolicy::Ephemeral))
        } else if self.durable.get(key.as_str())?.is_some() {
            Ok(Some(PersistencePolicy::Durable))
        } else {
            Ok(None)
        }
    }

    /// Write a key to the backend chosen by `policy` and drop it from the other.
    pub fn write(&self, key: CredentialKey, value: &str, policy: PersistencePolicy) -> Result<()> {
        trace!(%key, %policy, "writing credential");
        self.backend(policy).set(key.as_str(), value)?;
        self.backend(policy.other()).remove(key.as_str())
    }

    /// Remove a key from both backends.
    pub fn clear(&self, key: CredentialKey) -> Result<()> {
        self.ephemeral.remove(key.as_str())?;
        self.durable.remove(key.as_str())
    }

    /// Remove every credential key from both backends.
    pub fn clear_all(&self) -> Result<()> {
        for key in CredentialKey::ALL {
            self.clear(key)?;
        }
        Ok(())
    }

    /// Read and deserialize a JSON value.
    pub fn read_json<T: DeserializeOwned>(&self, key: CredentialKey) -> Result<Option<T>> {
        match self.read(key)? {
            Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| {
                StorageError::Serialization {
                    key: key.to_string(),
                    message: e.to_string(),
                }
                .into()
            }),
            None => Ok(None),
        }
    }

    /// Serialize and write a JSON value.
    pub fn write_json<T: Serialize>(
        &self,
        key: CredentialKey,
        value: &T,
        policy: PersistencePolicy,
    ) -> Result<()> {
        let raw = serde_json::to_string(value).map_err(|e| StorageError::Serialization {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.write(key, &raw, policy)
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}
