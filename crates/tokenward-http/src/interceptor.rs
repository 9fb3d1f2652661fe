//! The authenticated request pipeline.
//!
//! Every call goes through two stages. Outbound, the session's access token
//! is attached when there is one. Inbound, a 401 on anything but the refresh
//! endpoint renews the token once and resends the request; every other
//! failure is logged and returned unchanged.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use tokenward_core::error::Error;
use tokenward_core::Result;

use crate::api::{ApiRequest, ApiResponse};
use crate::session::AuthSession;

/// Records whether a request has already used its one refresh-and-retry.
#[derive(Debug, Default)]
struct RefreshGuard {
    consumed: bool,
}

impl RefreshGuard {
    /// Consume the guard; returns false if it was already consumed.
    fn try_consume(&mut self) -> bool {
        !std::mem::replace(&mut self.consumed, true)
    }
}

/// Sends requests on behalf of an [`AuthSession`].
///
/// Same shape as [`ApiClient::execute`](crate::ApiClient::execute), with
/// authorization handled transparently.
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    session: AuthSession,
}

impl AuthenticatedClient {
    pub fn new(session: AuthSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    fn is_refresh_endpoint(&self, request: &ApiRequest) -> bool {
        let refresh = &self.session.api().config().endpoints.refresh;
        request.path().trim_matches('/') == refresh.trim_matches('/')
    }

    /// Send a request, renewing the access token once on a 401.
    ///
    /// # Errors
    ///
    /// - [`AuthError::SessionExpired`](tokenward_core::error::AuthError::SessionExpired)
    ///   if the token could not be renewed; the session is already anonymous.
    /// - The retried request's error if it fails again, including a second 401.
    /// - Any other API or transport error, unchanged.
    #[instrument(skip(self, request), fields(method = %request.method(), path = request.path()))]
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let mut guard = RefreshGuard::default();
        let mut token = self.session.access_token();

        loop {
            match self.session.api().execute(request, token.as_ref()).await {
                Ok(response) => return Ok(response),
                Err(Error::Api(err))
                    if err.is_unauthorized()
                        && !self.is_refresh_endpoint(request)
                        && guard.try_consume() =>
                {
                    debug!("Request unauthorized, renewing access token");
                    let renewed = self.session.renew_after_rejection(token.as_ref()).await?;
                    token = Some(renewed);
                }
                Err(err) => {
                    log_failure(&err);
                    return Err(err);
                }
            }
        }
    }

    /// GET a path and decode the JSON response.
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.send(&ApiRequest::get(path)).await?.json()
    }

    /// POST a JSON body and decode the JSON response.
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let request = ApiRequest::post(path).with_json(body)?;
        self.send(&request).await?.json()
    }

    /// PUT a JSON body and decode the JSON response.
    pub async fn put_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let request = ApiRequest::put(path).with_json(body)?;
        self.send(&request).await?.json()
    }

    /// DELETE a path, ignoring any response body.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(&ApiRequest::delete(path)).await?;
        Ok(())
    }
}

fn log_failure(err: &Error) {
    match err {
        Error::Api(api) if api.is_forbidden() => warn!(error = %api, "Permission denied"),
        Error::Api(api) if api.is_not_found() => warn!(error = %api, "Resource not found"),
        Error::Api(api) if api.is_server_error() => warn!(error = %api, "Server error"),
        Error::Api(api) => warn!(error = %api, "API request failed"),
        Error::Transport(transport) => warn!(error = %transport, "Network failure"),
        other => debug!(error = %other, "Request failed"),
    }
}
