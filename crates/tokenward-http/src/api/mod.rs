//! HTTP plumbing for the remote API.
//!
//! [`ApiClient`] sends [`ApiRequest`]s and reads [`ApiResponse`]s with no
//! session awareness; `endpoints` holds the wire shapes of the auth calls.

mod client;
pub(crate) mod endpoints;
mod request;

pub use client::ApiClient;
pub use request::{ApiRequest, ApiResponse};
