// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use credgate_common::{ErrorBody, INVALID_CREDENTIALS_DETAIL};
use thiserror::Error;

use crate::storage::StoreError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    /// Unknown username or wrong password; the two are never told apart
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Username already registered: {0}")]
    DuplicateUsername(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::DuplicateUsername(_) => StatusCode::CONFLICT,
            AppError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::StorageUnavailable(_) | AppError::Hashing(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "AUTH_001",
            AppError::StorageUnavailable(_) => "STORE_001",
            AppError::DuplicateUsername(_) => "STORE_002",
            AppError::InvalidInput(_) => "VAL_001",
            AppError::Hashing(_) => "HASH_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// The `detail` sent to the client
    pub fn detail(&self) -> String {
        match self {
            AppError::InvalidCredentials => INVALID_CREDENTIALS_DETAIL.to_string(),
            AppError::StorageUnavailable(msg)
            | AppError::InvalidInput(msg)
            | AppError::Internal(msg) => msg.clone(),
            AppError::DuplicateUsername(_) => "Username already registered".to_string(),
            AppError::Hashing(_) => "Password hashing failed".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.error_code(), error = %self, "request rejected");
        }

        (status, axum::Json(ErrorBody::new(self.detail()))).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername(username) => AppError::DuplicateUsername(username),
            other => AppError::StorageUnavailable(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Blocking task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(AppError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::StorageUnavailable("down".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::DuplicateUsername("alice".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InvalidInput("missing field".to_string()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::InvalidCredentials.error_code(), "AUTH_001");
        assert_eq!(
            AppError::StorageUnavailable("down".to_string()).error_code(),
            "STORE_001"
        );
    }

    #[test]
    fn test_store_error_conversion() {
        let io = StoreError::Io(IoError::new(ErrorKind::PermissionDenied, "Permission denied"));
        let app_err: AppError = io.into();
        assert!(matches!(app_err, AppError::StorageUnavailable(ref msg) if msg.contains("Permission denied")));

        let dup: AppError = StoreError::DuplicateUsername("alice".to_string()).into();
        assert!(matches!(dup, AppError::DuplicateUsername(ref name) if name == "alice"));
    }

    #[tokio::test]
    async fn test_storage_error_passes_message_through() {
        let response = AppError::StorageUnavailable("connection refused".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("application/json"));
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "detail": "connection refused" })
        );
    }

    #[tokio::test]
    async fn test_hashing_error_is_sanitized() {
        let response = AppError::Hashing("salt invalid".to_string()).into_response();
        let body = body_json(response).await;
        assert_eq!(body["detail"], "Password hashing failed");
    }

    #[tokio::test]
    async fn test_invalid_credentials_body() {
        let response = AppError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "detail": "Invalid username or password" })
        );
    }
}
