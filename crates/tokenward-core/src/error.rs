//! Error types for tokenward.
//!
//! A single [`Error`] covers transport, session, API, storage and input
//! failures. Session failures ([`AuthError`]) are terminal: by the time one
//! reaches a caller the session has already been reset to anonymous.

use std::fmt;
use thiserror::Error;

/// The unified error type for tokenward operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout, body decoding).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Session errors that force the user to authenticate again.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// A non-success response from the remote API, passed through unchanged.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Credential storage backend failures.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation errors.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns true if this error means the user must log in again.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Error::Auth(AuthError::SessionExpired { .. }))
    }

    /// Returns the HTTP status of an API error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(err) => Some(err.status),
            _ => None,
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// The response body could not be decoded.
    #[error("invalid response body: {message}")]
    Decode { message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Session-terminating errors.
///
/// `Clone` so a single refresh outcome can be handed to every request that
/// was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The login endpoint rejected the credentials, or login could not complete.
    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The refresh token is missing, invalid or was rejected.
    #[error("session expired: {reason}")]
    SessionExpired { reason: String },
}

impl AuthError {
    pub fn authentication_failed(message: impl Into<String>) -> Self {
        AuthError::AuthenticationFailed {
            message: message.into(),
        }
    }

    pub fn session_expired(reason: impl Into<String>) -> Self {
        AuthError::SessionExpired {
            reason: reason.into(),
        }
    }
}

/// A non-success HTTP response from the remote API.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Machine-readable error code (if present).
    pub error: Option<String>,
    /// Human-readable message from the server.
    pub message: Option<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Create a new API error.
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
        }
    }

    /// 401: the access credential was missing or rejected.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// 403: authenticated, but not allowed.
    pub fn is_forbidden(&self) -> bool {
        self.status == 403
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// The best available description of the failure.
    pub fn describe(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| format!("HTTP {}", self.status))
    }
}

/// Credential storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem or platform storage failure.
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// Stored data could not be (de)serialized.
    #[error("corrupt stored value for '{key}': {message}")]
    Serialization { key: String, message: String },

    /// The backend is unusable (e.g. a poisoned lock).
    #[error("storage backend unavailable: {message}")]
    Unavailable { message: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// A token contains characters not allowed in an HTTP header.
    #[error("token is not a valid header value")]
    HeaderValue,

    /// Invalid registration data.
    #[error("invalid registration: {reason}")]
    Registration { reason: String },

    /// A user profile must be a JSON object.
    #[error("invalid profile: {reason}")]
    Profile { reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
