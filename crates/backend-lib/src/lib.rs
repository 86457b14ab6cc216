// ============================
// credgate-lib/src/lib.rs
// ============================
//! Core functionality for the `credgate` register/login backend.

pub mod config;
pub mod credential;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod router;
pub mod storage;

use std::sync::Arc;

use axum::http::HeaderValue;

use crate::config::Settings;
use crate::credential::{CredentialHasher, CredentialService};
use crate::storage::CredentialStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Register/login service
    pub credentials: Arc<CredentialService>,
    /// Validated CORS origin
    pub allowed_origin: HeaderValue,
}

impl AppState {
    /// Create a new application state around an already opened store
    pub fn new(store: Arc<dyn CredentialStore>, settings: &Settings) -> anyhow::Result<Self> {
        let allowed_origin = settings.allowed_origin()?;
        let hasher = CredentialHasher::from_settings(&settings.hashing)?;
        let credentials = Arc::new(CredentialService::new(store, hasher)?);

        Ok(Self {
            credentials,
            allowed_origin,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::{Argon2Settings, HashAlgorithm, HashSettings, ScryptSettings};

    /// Hashing parameters fast enough for unit tests
    pub(crate) fn cheap_settings(algorithm: HashAlgorithm) -> HashSettings {
        HashSettings {
            algorithm,
            scrypt: ScryptSettings { log_n: 4, r: 8, p: 1 },
            argon2: Argon2Settings {
                memory_kib: 64,
                iterations: 1,
                parallelism: 1,
            },
        }
    }
}
