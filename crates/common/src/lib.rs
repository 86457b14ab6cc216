// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between `credgate` clients and the server.
//! This module defines the JSON bodies of the register and login endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// Message returned by a successful registration
pub const REGISTERED_MESSAGE: &str = "User registered successfully";

/// Detail returned for every failed login
pub const INVALID_CREDENTIALS_DETAIL: &str = "Invalid username or password";

/// Request body of both `/register/` and `/login/`
/// # Fields
/// * `username` - Name the credential is stored under
/// * `password` - Plaintext password, wiped from memory on drop
#[derive(Serialize, Deserialize, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Drop for Credentials {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

/// Successful registration
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RegisterResponse {
    pub message: String,
}

impl Default for RegisterResponse {
    fn default() -> Self {
        Self {
            message: REGISTERED_MESSAGE.to_string(),
        }
    }
}

/// Successful login. Never carries the password hash.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    pub username: String,
    pub id: String,
}

/// Body of every error response
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub detail: String,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("alice", "secret123");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("secret123"));
    }

    #[test]
    fn credentials_reject_missing_fields() {
        assert!(serde_json::from_str::<Credentials>(r#"{"username":"alice"}"#).is_err());
        assert!(serde_json::from_str::<Credentials>(r#"{"username":"alice","password":7}"#).is_err());

        let creds: Credentials =
            serde_json::from_str(r#"{"username":"alice","password":"secret123"}"#).unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "secret123");
    }

    #[test]
    fn register_response_uses_fixed_message() {
        let json = serde_json::to_value(RegisterResponse::default()).unwrap();
        assert_eq!(json, serde_json::json!({ "message": REGISTERED_MESSAGE }));
    }
}
