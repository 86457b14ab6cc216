// crates/backend-lib/src/handlers/auth.rs

//! `/register/` and `/login/` handlers.
use std::sync::Arc;

use axum::{
    extract::{FromRequest, State},
    response::{IntoResponse, Response},
    Json,
};
use credgate_common::{Credentials, LoginResponse, RegisterResponse};
use serde::Serialize;

use crate::error::AppError;
use crate::AppState;

/// JSON extractor whose rejection is an [`AppError`], so malformed bodies
/// get the same `{detail}` shape as every other error
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl<T: Serialize> IntoResponse for AppJson<T> {
    fn into_response(self) -> Response {
        Json(self.0).into_response()
    }
}

/// `POST /register/`
pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(creds): AppJson<Credentials>,
) -> Result<AppJson<RegisterResponse>, AppError> {
    state.credentials.register(&creds).await.map(AppJson)
}

/// `POST /login/`
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(creds): AppJson<Credentials>,
) -> Result<AppJson<LoginResponse>, AppError> {
    state.credentials.login(&creds).await.map(AppJson)
}
