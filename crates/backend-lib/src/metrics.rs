// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const REGISTERED: &str = "credential.registered";
pub const LOGIN_SUCCEEDED: &str = "credential.login.succeeded";
pub const LOGIN_FAILED: &str = "credential.login.failed";
