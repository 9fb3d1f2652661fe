//! Request and response bodies of the authentication endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tokenward_core::UserProfile;

/// Response from the login endpoint.
///
/// Token fields accept both `accessToken`/`refreshToken` and the shorter
/// `access`/`refresh` names.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    #[serde(alias = "access")]
    pub access_token: String,
    #[serde(alias = "refresh")]
    pub refresh_token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// Request body for the refresh endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Response from the refresh endpoint.
///
/// Servers that rotate refresh tokens return the new one alongside.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshResponse {
    #[serde(alias = "access")]
    pub access_token: String,
    #[serde(default, alias = "refresh")]
    pub refresh_token: Option<String>,
}

/// Request body for the captcha endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct CaptchaRequest<'a> {
    pub email: &'a str,
}

/// Error body fields worth surfacing.
#[derive(Debug, Default)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    /// Extract `error` and `message` (or `detail`) from a JSON error body.
    pub(crate) fn from_value(value: &Value) -> Self {
        let field = |name: &str| {
            value.get(name).and_then(|v| match v {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
        };

        Self {
            error: field("error"),
            message: field("message").or_else(|| field("detail")),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.error.is_none() && self.message.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_response_accepts_short_token_names() {
        let response: LoginResponse = serde_json::from_value(json!({
            "access": "A1",
            "refresh": "R1",
            "user": {"id": 1, "username": "alice"}
        }))
        .unwrap();
        assert_eq!(response.access_token, "A1");
        assert_eq!(response.refresh_token, "R1");
        assert_eq!(response.user.unwrap().username(), Some("alice"));
    }

    #[test]
    fn login_response_without_user() {
        let response: LoginResponse = serde_json::from_value(json!({
            "accessToken": "A1",
            "refreshToken": "R1"
        }))
        .unwrap();
        assert!(response.user.is_none());
    }

    #[test]
    fn refresh_request_body() {
        let body = serde_json::to_value(RefreshRequest { refresh_token: "R1" }).unwrap();
        assert_eq!(body, json!({"refreshToken": "R1"}));
    }

    #[test]
    fn refresh_response_rotation_is_optional() {
        let plain: RefreshResponse = serde_json::from_value(json!({"access": "A2"})).unwrap();
        assert_eq!(plain.access_token, "A2");
        assert!(plain.refresh_token.is_none());

        let rotated: RefreshResponse =
            serde_json::from_value(json!({"accessToken": "A2", "refreshToken": "R2"})).unwrap();
        assert_eq!(rotated.refresh_token.as_deref(), Some("R2"));
    }

    #[test]
    fn error_body_prefers_message_then_detail() {
        let body = ErrorBody::from_value(&json!({"detail": "Token is invalid or expired"}));
        assert_eq!(body.message.as_deref(), Some("Token is invalid or expired"));
        assert!(body.error.is_none());

        let body = ErrorBody::from_value(&json!({"error": {"email": ["taken"]}}));
        assert_eq!(body.error.as_deref(), Some("{\"email\":[\"taken\"]}"));

        assert!(ErrorBody::from_value(&json!({"username": ["required"]})).is_empty());
    }
}
