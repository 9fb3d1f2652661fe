//! Cached user profile.
//!
//! The profile is whatever JSON object the API returns for the current user.
//! tokenward does not interpret it beyond a few convenience accessors.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, InvalidInputError};

/// The current user's profile, guaranteed to be a JSON object.
///
/// # Example
///
/// ```
/// use tokenward_core::UserProfile;
/// use serde_json::json;
///
/// let profile = UserProfile::new(json!({"id": 7, "username": "alice"})).unwrap();
/// assert_eq!(profile.username(), Some("alice"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile(Value);

impl UserProfile {
    /// Wrap a JSON value as a profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a JSON object.
    pub fn new(value: Value) -> Result<Self, Error> {
        if !value.is_object() {
            return Err(InvalidInputError::Profile {
                reason: "profile must be a JSON object".to_string(),
            }
            .into());
        }
        Ok(Self(value))
    }

    /// Accept either a bare profile object or one wrapped as
    /// `{"profile": {...}}` / `{"user": {...}}`.
    pub fn from_response(value: Value) -> Result<Self, Error> {
        match value {
            Value::Object(mut map) if map.len() == 1 => {
                match map.remove("profile").or_else(|| map.remove("user")) {
                    Some(inner) => Self::new(inner),
                    None => Self::new(Value::Object(map)),
                }
            }
            other => Self::new(other),
        }
    }

    /// Returns the `username` field, if present.
    pub fn username(&self) -> Option<&str> {
        self.0.get("username").and_then(Value::as_str)
    }

    /// Returns the `email` field, if present.
    pub fn email(&self) -> Option<&str> {
        self.0.get("email").and_then(Value::as_str)
    }

    /// Returns a field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl Serialize for UserProfile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UserProfile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        UserProfile::new(value).map_err(serde::de::Error::custom)
    }
}
