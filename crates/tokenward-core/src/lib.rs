//! tokenward-core - Session types, credential storage and errors.
//!
//! This crate holds everything about a client session that does not touch the
//! network: tokens, login input, the cached profile, the persistence policy,
//! and the [`CredentialStore`] that enforces read precedence between an
//! ephemeral and a durable [`StorageBackend`].

pub mod credentials;
pub mod error;
pub mod policy;
pub mod profile;
pub mod store;
pub mod tokens;
pub mod traits;
pub mod types;

pub use credentials::{LoginCredentials, Registration};
pub use error::Error;
pub use policy::PersistencePolicy;
pub use profile::UserProfile;
pub use store::{CredentialKey, CredentialStore};
pub use tokens::{AccessToken, RefreshToken};
pub use traits::StorageBackend;
pub use types::ApiUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
