// ============================
// credgate-lib/src/router.rs
// ============================
//! HTTP router and cross-origin policy.
use std::sync::Arc;

use axum::{
    http::{request::Parts, HeaderValue},
    routing::post,
    Router,
};
use tower_http::{
    cors::{AllowCredentials, AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers;
use crate::AppState;

/// Create the register/login router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.allowed_origin.clone());

    Router::new()
        .route("/register/", post(handlers::register))
        .route("/login/", post(handlers::login))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// One origin, any method or header, credentials allowed.
///
/// Requests from any other origin get neither `access-control-allow-origin`
/// nor `access-control-allow-credentials`.
///
/// Wildcards are invalid alongside credentials, so methods and headers are
/// mirrored from the request instead.
pub fn cors_layer(origin: HeaderValue) -> CorsLayer {
    let credentialed = origin.clone();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(AllowCredentials::predicate(
            move |request_origin: &HeaderValue, _: &Parts| *request_origin == credentialed,
        ))
}
