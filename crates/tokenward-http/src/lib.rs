//! tokenward-http - Authenticated HTTP client with transparent token renewal.
//!
//! - [`AuthSession`] owns the session: login, logout, restore, refresh.
//! - [`AuthenticatedClient`] sends requests for the session, attaching the
//!   access token and renewing it once when the server answers 401.
//! - [`ApiClient`] is the raw, session-unaware HTTP layer underneath.
//!
//! Concurrent 401s share a single refresh call.

mod api;
mod config;
mod interceptor;
mod refresh;
mod session;

pub use api::{ApiClient, ApiRequest, ApiResponse};
pub use config::{ClientConfig, DEFAULT_TIMEOUT, Endpoints};
pub use interceptor::AuthenticatedClient;
pub use reqwest::{Method, StatusCode};
pub use session::{AuthSession, Credential, SessionSnapshot, SessionStatus};
