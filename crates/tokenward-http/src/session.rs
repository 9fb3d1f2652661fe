//! Authentication session state and lifecycle.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use tokenward_core::error::{AuthError, Error};
use tokenward_core::{
    AccessToken, CredentialKey, CredentialStore, LoginCredentials, PersistencePolicy,
    RefreshToken, Registration, Result, UserProfile,
};

use crate::api::ApiClient;
use crate::api::endpoints::{
    CaptchaRequest, LoginResponse, RefreshRequest, RefreshResponse,
};
use crate::config::Endpoints;
use crate::interceptor::AuthenticatedClient;
use crate::refresh::RefreshFlight;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// No credential held.
    #[default]
    Anonymous,
    /// A credential is held; the profile may not be loaded yet.
    Authenticated,
    /// The server rejected the access token and renewal has not started.
    Expired,
    /// A refresh request is in flight.
    Refreshing,
}

impl SessionStatus {
    /// True for every status in which a credential is held.
    pub fn is_authenticated(self) -> bool {
        !matches!(self, SessionStatus::Anonymous)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Anonymous => "anonymous",
            SessionStatus::Authenticated => "authenticated",
            SessionStatus::Expired => "expired",
            SessionStatus::Refreshing => "refreshing",
        };
        f.write_str(name)
    }
}

/// The tokens and cached profile of an authenticated session.
#[derive(Debug, Clone)]
pub struct Credential {
    pub access_token: AccessToken,
    /// Absent only for sessions restored from storage without one.
    pub refresh_token: Option<RefreshToken>,
    pub user: Option<UserProfile>,
}

/// A read-only copy of the session's observable state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub user: Option<UserProfile>,
    pub persistence: Option<PersistencePolicy>,
}

#[derive(Debug, Default)]
struct SessionState {
    credential: Option<Credential>,
    status: SessionStatus,
    persistence: Option<PersistencePolicy>,
    /// Bumped whenever the session is replaced or ended, so a refresh that
    /// completes afterwards can tell its result is stale.
    epoch: u64,
}

impl SessionState {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            user: self.credential.as_ref().and_then(|c| c.user.clone()),
            persistence: self.persistence,
        }
    }

    fn replace(&mut self, credential: Option<Credential>, persistence: Option<PersistencePolicy>) {
        self.status = if credential.is_some() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Anonymous
        };
        self.credential = credential;
        self.persistence = persistence;
        self.epoch += 1;
    }
}

/// The authentication session shared by application code and the
/// request pipeline.
///
/// Construct one per process and pass clones around; clones share state.
/// `AuthSession` is the only writer of session state and, through its
/// [`CredentialStore`], of persisted credentials.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tokenward_core::{ApiUrl, CredentialStore, LoginCredentials, PersistencePolicy};
/// use tokenward_http::{ApiClient, AuthSession, ClientConfig};
/// use tokenward_store::{FileBackend, MemoryBackend};
///
/// # async fn example() -> Result<(), tokenward_core::Error> {
/// let client = ApiClient::new(ClientConfig::new(ApiUrl::new("https://blog.example.com/api")?))?;
/// let store = CredentialStore::new(
///     Arc::new(MemoryBackend::new()),
///     Arc::new(FileBackend::new("/var/lib/app")),
/// );
/// let session = AuthSession::new(client, store);
///
/// session.restore();
/// if !session.is_authenticated() {
///     let creds = LoginCredentials::new("alice", "hunter2");
///     session.login(&creds, PersistencePolicy::Durable).await?;
/// }
///
/// let posts: serde_json::Value = session.client().get_json("/getposts").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuthSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    client: ApiClient,
    store: CredentialStore,
    state: RwLock<SessionState>,
    refresh: RefreshFlight,
}

impl AuthSession {
    /// Create an anonymous session.
    pub fn new(client: ApiClient, store: CredentialStore) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                client,
                store,
                state: RwLock::new(SessionState::default()),
                refresh: RefreshFlight::default(),
            }),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SessionState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn endpoints(&self) -> &Endpoints {
        &self.inner.client.config().endpoints
    }

    /// The raw API client, without session handling.
    pub fn api(&self) -> &ApiClient {
        &self.inner.client
    }

    /// The credential store backing this session.
    pub fn store(&self) -> &CredentialStore {
        &self.inner.store
    }

    /// A request pipeline that authenticates with this session.
    pub fn client(&self) -> AuthenticatedClient {
        AuthenticatedClient::new(self.clone())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn status(&self) -> SessionStatus {
        self.read_state().status
    }

    pub fn is_authenticated(&self) -> bool {
        self.status().is_authenticated()
    }

    /// The cached profile of the logged-in user, if loaded.
    pub fn current_user(&self) -> Option<UserProfile> {
        self.read_state()
            .credential
            .as_ref()
            .and_then(|c| c.user.clone())
    }

    /// The access token to attach to outgoing requests, if authenticated.
    pub fn access_token(&self) -> Option<AccessToken> {
        let state = self.read_state();
        if !state.status.is_authenticated() {
            return None;
        }
        state.credential.as_ref().map(|c| c.access_token.clone())
    }

    /// The backend the current credential was persisted to.
    pub fn persistence(&self) -> Option<PersistencePolicy> {
        self.read_state().persistence
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.read_state().snapshot()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Log in and persist the returned credential under `policy`.
    ///
    /// # Errors
    ///
    /// Any failure, including a storage failure after a successful call,
    /// ends the session and is reported as
    /// [`AuthError::AuthenticationFailed`].
    #[instrument(skip(self, credentials), fields(username = %credentials.username(), %policy))]
    pub async fn login(
        &self,
        credentials: &LoginCredentials,
        policy: PersistencePolicy,
    ) -> Result<SessionSnapshot> {
        info!("Logging in");

        match self.try_login(credentials, policy).await {
            Ok(snapshot) => {
                info!("Login succeeded");
                Ok(snapshot)
            }
            Err(err) => {
                warn!(error = %err, "Login failed");
                self.logout().await;
                Err(AuthError::authentication_failed(describe(&err)).into())
            }
        }
    }

    async fn try_login(
        &self,
        credentials: &LoginCredentials,
        policy: PersistencePolicy,
    ) -> Result<SessionSnapshot> {
        let response: LoginResponse = self
            .inner
            .client
            .post_json(&self.endpoints().login, credentials, None)
            .await?;

        let credential = Credential {
            access_token: AccessToken::new(response.access_token),
            refresh_token: Some(RefreshToken::new(response.refresh_token)),
            user: response.user,
        };

        let mut state = self.write_state();
        self.persist(&credential, policy)?;
        state.replace(Some(credential), Some(policy));
        Ok(state.snapshot())
    }

    /// Write a full credential to one backend, clearing the other.
    fn persist(&self, credential: &Credential, policy: PersistencePolicy) -> Result<()> {
        let store = &self.inner.store;

        store.write(
            CredentialKey::AccessToken,
            credential.access_token.as_str(),
            policy,
        )?;
        match &credential.refresh_token {
            Some(token) => store.write(CredentialKey::RefreshToken, token.as_str(), policy)?,
            None => store.clear(CredentialKey::RefreshToken)?,
        }
        match &credential.user {
            Some(user) => store.write_json(CredentialKey::User, user, policy)?,
            None => store.clear(CredentialKey::User)?,
        }

        debug!(%policy, "Credential persisted");
        Ok(())
    }

    /// Register a new account. Session state is not touched.
    #[instrument(skip(self, registration), fields(username = %registration.username()))]
    pub async fn register(&self, registration: &Registration) -> Result<Value> {
        info!("Registering account");
        self.inner
            .client
            .post_value(&self.endpoints().register, registration, None)
            .await
    }

    /// Ask the server to email a registration verification code.
    #[instrument(skip(self))]
    pub async fn request_captcha(&self, email: &str) -> Result<()> {
        self.inner
            .client
            .post_value(&self.endpoints().captcha, &CaptchaRequest { email }, None)
            .await
            .map(|_| ())
    }

    /// Load persisted credentials without contacting the server.
    ///
    /// A stored access token is trusted as-is; if it has been revoked, the
    /// first rejected request will trigger a refresh. Missing or unreadable
    /// storage leaves the session anonymous. Never fails.
    #[instrument(skip(self))]
    pub fn restore(&self) -> SessionStatus {
        let store = &self.inner.store;
        let mut state = self.write_state();

        let access_token = store.read(CredentialKey::AccessToken).unwrap_or_else(|err| {
            warn!(error = %err, "Failed to read stored access token");
            None
        });

        let Some(access_token) = access_token else {
            debug!("No stored credential");
            state.replace(None, None);
            return SessionStatus::Anonymous;
        };

        let refresh_token = store
            .read(CredentialKey::RefreshToken)
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to read stored refresh token");
                None
            })
            .map(RefreshToken::new);

        let user = store
            .read_json::<UserProfile>(CredentialKey::User)
            .unwrap_or_else(|err| {
                warn!(error = %err, "Ignoring unreadable stored profile");
                None
            });

        let persistence = store.holder(CredentialKey::AccessToken).unwrap_or(None);

        let credential = Credential {
            access_token: AccessToken::new(access_token),
            refresh_token,
            user,
        };

        state.replace(Some(credential), persistence);
        info!(persistence = ?persistence, "Session restored from storage");
        SessionStatus::Authenticated
    }

    /// Obtain a new access token with the refresh token.
    ///
    /// Concurrent callers share one refresh call and its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SessionExpired`] if no refresh token is available
    /// or the server rejects it; the session is logged out first.
    pub async fn refresh(&self) -> Result<AccessToken> {
        let session = self.clone();
        self.inner
            .refresh
            .run(move || async move { session.perform_refresh().await })
            .await
            .map_err(Error::from)
    }

    /// Renew access after the server rejected `rejected`.
    ///
    /// If another request already replaced that token, the current one is
    /// returned without a network call.
    #[instrument(skip(self, rejected))]
    pub async fn renew_after_rejection(
        &self,
        rejected: Option<&AccessToken>,
    ) -> Result<AccessToken> {
        {
            let mut state = self.write_state();
            let status = state.status;
            if let Some(credential) = state.credential.as_ref()
                && status == SessionStatus::Authenticated
            {
                if rejected.is_some_and(|token| *token != credential.access_token) {
                    debug!("Access token was already renewed");
                    return Ok(credential.access_token.clone());
                }
                state.status = SessionStatus::Expired;
            }
        }

        self.refresh().await
    }

    #[instrument(skip(self))]
    async fn perform_refresh(&self) -> std::result::Result<AccessToken, AuthError> {
        info!("Refreshing access token");

        let (epoch, in_memory) = {
            let mut state = self.write_state();
            if state.credential.is_some() {
                state.status = SessionStatus::Refreshing;
            }
            let token = state
                .credential
                .as_ref()
                .and_then(|c| c.refresh_token.clone());
            (state.epoch, token)
        };

        let Some(refresh_token) = in_memory.or_else(|| self.stored_refresh_token()) else {
            warn!("No refresh token available");
            self.end_session(Some(epoch)).await;
            return Err(AuthError::session_expired("no refresh token available"));
        };

        match self.exchange_refresh_token(&refresh_token, epoch).await {
            Ok(Some(token)) => {
                info!("Access token refreshed");
                Ok(token)
            }
            Ok(None) => {
                debug!("Session replaced during refresh, discarding new token");
                Err(superseded())
            }
            Err(err) => {
                if self.end_session(Some(epoch)).await {
                    warn!(error = %err, "Token refresh failed, session ended");
                    Err(session_expired(err))
                } else {
                    debug!(error = %err, "Refresh for a replaced session failed, ignoring");
                    Err(superseded())
                }
            }
        }
    }

    /// The refresh token persisted in either backend.
    fn stored_refresh_token(&self) -> Option<RefreshToken> {
        self.inner
            .store
            .read(CredentialKey::RefreshToken)
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to read stored refresh token");
                None
            })
            .filter(|token| !token.is_empty())
            .map(RefreshToken::new)
    }

    /// Exchange the refresh token and apply the result.
    ///
    /// Returns `Ok(None)` without touching state or storage when the session
    /// was replaced or ended after `epoch` was taken.
    async fn exchange_refresh_token(
        &self,
        refresh_token: &RefreshToken,
        epoch: u64,
    ) -> Result<Option<AccessToken>> {
        let request = RefreshRequest {
            refresh_token: refresh_token.as_str(),
        };
        let response: RefreshResponse = self
            .inner
            .client
            .post_json(&self.endpoints().refresh, &request, None)
            .await?;

        let mut state = self.write_state();
        if state.epoch != epoch {
            return Ok(None);
        }

        let access_token = AccessToken::new(response.access_token);
        let rotated = response.refresh_token.map(RefreshToken::new);

        // Write back to wherever the refresh token lives.
        let store = &self.inner.store;
        let policy = match store.holder(CredentialKey::RefreshToken)? {
            Some(PersistencePolicy::Durable) => PersistencePolicy::Durable,
            _ => PersistencePolicy::Ephemeral,
        };
        store.write(CredentialKey::AccessToken, access_token.as_str(), policy)?;
        if let Some(ref rotated) = rotated {
            store.write(CredentialKey::RefreshToken, rotated.as_str(), policy)?;
        }

        let user = state.credential.as_ref().and_then(|c| c.user.clone());
        state.credential = Some(Credential {
            access_token: access_token.clone(),
            refresh_token: Some(rotated.unwrap_or_else(|| refresh_token.clone())),
            user,
        });
        state.status = SessionStatus::Authenticated;
        state.persistence = Some(policy);

        Ok(Some(access_token))
    }

    /// Load the current user's profile and cache it.
    ///
    /// Goes through the request pipeline, so an expired access token is
    /// renewed transparently.
    #[instrument(skip(self))]
    pub async fn fetch_profile(&self) -> Result<UserProfile> {
        let response: Value = self.client().get_json(&self.endpoints().profile).await?;
        let profile = UserProfile::from_response(response)?;

        {
            let mut state = self.write_state();
            if let Some(credential) = state.credential.as_mut() {
                credential.user = Some(profile.clone());
                if let Some(policy) = self.inner.store.holder(CredentialKey::AccessToken)? {
                    self.inner
                        .store
                        .write_json(CredentialKey::User, &profile, policy)?;
                }
            }
        }

        debug!(username = ?profile.username(), "Profile loaded");
        Ok(profile)
    }

    /// End the session locally, then tell the server on a best-effort basis.
    ///
    /// Local state and both storage backends are always cleared, whether or
    /// not the server can be reached. The server is notified even when no
    /// session was held, without an authorization header in that case.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.end_session(None).await;
    }

    /// Clear memory and storage, then notify the server.
    ///
    /// With `expected_epoch`, nothing happens if the session has been
    /// replaced or ended since that epoch; returns whether it was ended.
    async fn end_session(&self, expected_epoch: Option<u64>) -> bool {
        let previous = {
            let mut state = self.write_state();
            if expected_epoch.is_some_and(|epoch| epoch != state.epoch) {
                return false;
            }

            let previous = state.credential.take().map(|c| c.access_token);
            state.replace(None, None);
            if let Err(err) = self.inner.store.clear_all() {
                warn!(error = %err, "Failed to clear stored credentials");
            }
            previous
        };

        if let Err(err) = self
            .inner
            .client
            .post_empty(&self.endpoints().logout, previous.as_ref())
            .await
        {
            debug!(error = %err, "Remote logout failed, ignoring");
        }
        if previous.is_some() {
            info!("Logged out");
        }
        true
    }
}

/// The error handed to requests waiting on a refresh whose session is gone.
fn superseded() -> AuthError {
    AuthError::session_expired("session replaced during refresh")
}

/// Convert a refresh failure into the session-expired error callers see.
fn session_expired(err: Error) -> AuthError {
    match err {
        Error::Auth(auth) => auth,
        other => AuthError::session_expired(describe(&other)),
    }
}

/// The most useful one-line description of a failure.
fn describe(err: &Error) -> String {
    match err {
        Error::Api(api) => api.describe(),
        other => other.to_string(),
    }
}

// Custom Debug impl that hides sensitive data
impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read_state();
        f.debug_struct("AuthSession")
            .field("status", &state.status)
            .field("persistence", &state.persistence)
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}
