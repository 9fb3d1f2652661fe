//! Key/value storage backend trait.

use crate::Result;

/// A synchronous string key/value store holding persisted credentials.
///
/// Implementations decide the lifetime of their data: an ephemeral backend
/// forgets everything when the session ends, a durable one survives restarts.
/// Errors mean the backend itself is unusable; absence is `Ok(None)`.
pub trait StorageBackend: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
