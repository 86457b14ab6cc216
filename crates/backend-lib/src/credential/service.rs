use std::sync::Arc;

use credgate_common::{Credentials, LoginResponse, RegisterResponse};
use metrics::counter;
use tokio::task;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::password::{verify_password, CredentialHasher};
use crate::error::AppError;
use crate::metrics::{LOGIN_FAILED, LOGIN_SUCCEEDED, REGISTERED};
use crate::storage::CredentialStore;

/// Hashed once per service so unknown usernames pay for a verification too
const TIMING_DECOY_PASSWORD: &str = "credgate-timing-decoy";

/// Registers and verifies credentials against an injected store
pub struct CredentialService {
    store: Arc<dyn CredentialStore>,
    hasher: CredentialHasher,
    /// Verified in place of a missing record. Costs the same as hashes made
    /// with the current parameters; records hashed under earlier parameters
    /// verify at their own cost, so after an algorithm or cost change those
    /// records are distinguishable from missing ones by timing.
    decoy_hash: String,
}

impl CredentialService {
    /// Runs one hash to prepare the decoy, so call it off the request path
    pub fn new(store: Arc<dyn CredentialStore>, hasher: CredentialHasher) -> Result<Self, AppError> {
        let decoy_hash = hasher.hash_password(TIMING_DECOY_PASSWORD)?;
        Ok(Self {
            store,
            hasher,
            decoy_hash,
        })
    }

    pub fn hasher(&self) -> &CredentialHasher {
        &self.hasher
    }

    /// Hash the password under a fresh salt and store a new record.
    ///
    /// No duplicate check happens here; the store decides.
    pub async fn register(&self, creds: &Credentials) -> Result<RegisterResponse, AppError> {
        let plain = Zeroizing::new(creds.password.clone());
        let hasher = self.hasher.clone();
        let password_hash = task::spawn_blocking(move || hasher.hash_password(&plain)).await??;

        let record = self.store.insert(&creds.username, &password_hash).await?;
        counter!(REGISTERED).increment(1);
        info!(username = %record.username, id = %record.id, "registered credential");

        Ok(RegisterResponse::default())
    }

    /// Verify a username/password pair.
    ///
    /// Unknown usernames and wrong passwords both yield
    /// [`AppError::InvalidCredentials`].
    pub async fn login(&self, creds: &Credentials) -> Result<LoginResponse, AppError> {
        let record = self.store.find_by_username(&creds.username).await?;

        let hash = record
            .as_ref()
            .map_or_else(|| self.decoy_hash.clone(), |r| r.password_hash.clone());
        let plain = Zeroizing::new(creds.password.clone());
        let verified = task::spawn_blocking(move || verify_password(&hash, &plain)).await?;

        match record {
            Some(record) if verified => {
                counter!(LOGIN_SUCCEEDED).increment(1);
                info!(username = %record.username, id = %record.id, "login succeeded");
                Ok(LoginResponse {
                    username: record.username,
                    id: record.id,
                })
            },
            found => {
                counter!(LOGIN_FAILED).increment(1);
                warn!(username = %creds.username, "login failed");
                debug!(known_username = found.is_some(), "login failure cause");
                Err(AppError::InvalidCredentials)
            },
        }
    }
}
