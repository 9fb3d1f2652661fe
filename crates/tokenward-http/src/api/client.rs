//! Raw HTTP client for the remote API.
//!
//! This client knows nothing about sessions: callers pass the token to use,
//! if any. Authorization renewal lives in [`AuthenticatedClient`](crate::AuthenticatedClient).

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, trace};

use tokenward_core::error::{ApiError, Error, InvalidInputError, TransportError};
use tokenward_core::{AccessToken, Result};

use crate::config::ClientConfig;

use super::endpoints::ErrorBody;
use super::request::{ApiRequest, ApiResponse};

/// Maximum length of a raw error body carried in an error message.
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Map a reqwest failure onto the transport error taxonomy.
pub(crate) fn transport_error(err: reqwest::Error) -> Error {
    let transport = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else if err.is_decode() {
        TransportError::Decode {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    Error::Transport(transport)
}

/// HTTP client bound to one API base URL.
///
/// Clone is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl ApiClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the TLS backend cannot be initialized.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(transport_error)?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Returns the configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a request, optionally with a bearer token.
    ///
    /// Non-success statuses come back as [`Error::Api`].
    #[instrument(skip(self, request, token), fields(method = %request.method(), path = request.path()))]
    pub async fn execute(
        &self,
        request: &ApiRequest,
        token: Option<&AccessToken>,
    ) -> Result<ApiResponse> {
        let url = self.config.base_url.endpoint(request.path());
        debug!(%url, authenticated = token.is_some(), "API request");

        let mut builder = self.client.request(request.method().clone(), &url);

        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            let value = HeaderValue::from_str(&token.bearer())
                .map_err(|_| InvalidInputError::HeaderValue)?;
            builder = builder.header(AUTHORIZATION, value);
        }

        let response = builder.send().await.map_err(transport_error)?;
        self.handle_response(response).await
    }

    /// POST a JSON body and decode a JSON response.
    pub(crate) async fn post_json<B, R>(
        &self,
        path: &str,
        body: &B,
        token: Option<&AccessToken>,
    ) -> Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let request = ApiRequest::post(path).with_json(body)?;
        self.execute(&request, token).await?.json()
    }

    /// POST a JSON body and return whatever JSON comes back (`null` if empty).
    pub(crate) async fn post_value<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        token: Option<&AccessToken>,
    ) -> Result<Value> {
        let request = ApiRequest::post(path).with_json(body)?;
        self.execute(&request, token).await?.json_value()
    }

    /// POST without a body, ignoring the response content.
    pub(crate) async fn post_empty(&self, path: &str, token: Option<&AccessToken>) -> Result<()> {
        self.execute(&ApiRequest::post(path), token).await?;
        Ok(())
    }

    /// Read the body of a response, or turn a failure status into an error.
    async fn handle_response(&self, response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status();
        trace!(status = %status, "API response");

        let body = response.bytes().await.map_err(transport_error)?.to_vec();

        if status.is_success() {
            Ok(ApiResponse::new(status, body))
        } else {
            Err(Error::Api(Self::parse_error(status.as_u16(), &body)))
        }
    }

    /// Build an [`ApiError`] from a failure body, JSON or not.
    fn parse_error(status: u16, body: &[u8]) -> ApiError {
        let parsed = serde_json::from_slice::<Value>(body)
            .map(|value| ErrorBody::from_value(&value))
            .unwrap_or_default();

        if !parsed.is_empty() {
            return ApiError::new(status, parsed.error, parsed.message);
        }

        let text = String::from_utf8_lossy(body);
        let text = text.trim();
        let message = if text.is_empty() {
            None
        } else if text.len() <= MAX_ERROR_BODY_LENGTH {
            Some(text.to_string())
        } else {
            let cut = (0..=MAX_ERROR_BODY_LENGTH)
                .rev()
                .find(|&i| text.is_char_boundary(i))
                .unwrap_or(0);
            Some(format!(
                "{}... (truncated, {} total bytes)",
                &text[..cut],
                text.len()
            ))
        };

        ApiError::new(status, None, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenward_core::ApiUrl;

    #[test]
    fn client_creation() {
        let api = ApiUrl::new("https://blog.example.com/api").unwrap();
        let client = ApiClient::new(ClientConfig::new(api.clone())).unwrap();
        assert_eq!(client.config().base_url, api);
    }

    #[test]
    fn parse_error_uses_json_fields() {
        let err = ApiClient::parse_error(400, br#"{"error": "bad credentials"}"#);
        assert_eq!(err.status, 400);
        assert_eq!(err.error.as_deref(), Some("bad credentials"));
    }

    #[test]
    fn parse_error_falls_back_to_text() {
        let err = ApiClient::parse_error(500, b"Internal Server Error");
        assert_eq!(err.message.as_deref(), Some("Internal Server Error"));

        let err = ApiClient::parse_error(503, b"");
        assert!(err.message.is_none());
        assert_eq!(err.to_string(), "HTTP 503");
    }

    #[test]
    fn parse_error_truncates_long_bodies() {
        let body = "x".repeat(2000);
        let err = ApiClient::parse_error(502, body.as_bytes());
        let message = err.message.unwrap();
        assert!(message.contains("truncated, 2000 total bytes"));
        assert!(message.len() < 600);
    }
}
