// ============================
// credgate-lib/src/credential/mod.rs
// ============================
//! Credential hashing and the register/login service.

pub mod password;
mod service;

pub use password::{verify_password, CredentialHasher};
pub use service::CredentialService;
