//! Login and registration input types.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, InvalidInputError};

/// Username and password for the login endpoint.
///
/// # Security
///
/// The password is never exposed in Debug output to prevent accidental logging.
///
/// # Example
///
/// ```
/// use tokenward_core::LoginCredentials;
///
/// let creds = LoginCredentials::new("alice", "hunter2");
/// assert_eq!(creds.username(), "alice");
/// ```
#[derive(Clone, Serialize)]
pub struct LoginCredentials {
    username: String,
    password: String,
}

impl LoginCredentials {
    /// Create new credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the username.
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Account registration data.
///
/// Construction checks the fields the server would reject outright, so a
/// mismatched confirmation never leaves the client.
#[derive(Clone, Serialize)]
pub struct Registration {
    username: String,
    email: String,
    password: String,
    password_confirm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    captcha: Option<String>,
}

impl Registration {
    /// Create a registration request.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError::Registration`] if the username or email is
    /// blank, or the password confirmation does not match.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        password_confirm: impl Into<String>,
    ) -> Result<Self, Error> {
        let registration = Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            password_confirm: password_confirm.into(),
            captcha: None,
        };
        registration.validate()?;
        Ok(registration)
    }

    /// Attach the email verification code sent by the captcha endpoint.
    pub fn with_captcha(mut self, captcha: impl Into<String>) -> Self {
        self.captcha = Some(captcha.into());
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    fn validate(&self) -> Result<(), Error> {
        let reason = if self.username.trim().is_empty() {
            "username must not be empty"
        } else if !self.email.contains('@') {
            "email must be an address"
        } else if self.password.is_empty() {
            "password must not be empty"
        } else if self.password != self.password_confirm {
            "passwords do not match"
        } else {
            return Ok(());
        };

        Err(InvalidInputError::Registration {
            reason: reason.to_string(),
        }
        .into())
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("password_confirm", &"[REDACTED]")
            .field("captcha", &self.captcha)
            .finish()
    }
}
