//! Client configuration.

use std::time::Duration;

use tokenward_core::ApiUrl;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Paths of the remote endpoints this client talks to, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub login: String,
    pub logout: String,
    pub register: String,
    pub refresh: String,
    pub profile: String,
    pub captcha: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/auth/login".to_string(),
            logout: "/auth/logout".to_string(),
            register: "/auth/register".to_string(),
            refresh: "/token/refresh".to_string(),
            profile: "/profile".to_string(),
            captcha: "/captcha".to_string(),
        }
    }
}

impl Endpoints {
    /// Append a trailing slash to every path, for servers that route on it.
    pub fn with_trailing_slashes(self) -> Self {
        fn slash(path: String) -> String {
            if path.ends_with('/') {
                path
            } else {
                format!("{}/", path)
            }
        }

        Self {
            login: slash(self.login),
            logout: slash(self.logout),
            register: slash(self.register),
            refresh: slash(self.refresh),
            profile: slash(self.profile),
            captcha: slash(self.captcha),
        }
    }
}

/// Configuration for [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: ApiUrl,
    pub timeout: Duration,
    pub user_agent: String,
    pub endpoints: Endpoints,
}

impl ClientConfig {
    /// Default configuration for the given API.
    pub fn new(base_url: ApiUrl) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("tokenward/", env!("CARGO_PKG_VERSION")).to_string(),
            endpoints: Endpoints::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}
