// ============================
// credgate-lib/src/credential/password.rs
// ============================
//! Password hashing and verification.
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Version,
};
use scrypt::Scrypt;

use crate::config::{HashAlgorithm, HashSettings};
use crate::error::AppError;

/// Output length of scrypt hashes, in bytes
const SCRYPT_OUTPUT_LEN: usize = 32;

/// Hashes new passwords with the configured adaptive algorithm.
///
/// Every hash is a PHC string carrying its own algorithm, parameters and
/// salt, so verification never needs this configuration.
#[derive(Debug, Clone)]
pub enum CredentialHasher {
    Scrypt(scrypt::Params),
    Argon2id(argon2::Params),
}

impl CredentialHasher {
    pub fn from_settings(settings: &HashSettings) -> Result<Self, AppError> {
        match settings.algorithm {
            HashAlgorithm::Scrypt => {
                let s = settings.scrypt;
                scrypt::Params::new(s.log_n, s.r, s.p, SCRYPT_OUTPUT_LEN)
                    .map(CredentialHasher::Scrypt)
                    .map_err(|e| AppError::Hashing(format!("scrypt parameters: {e}")))
            },
            HashAlgorithm::Argon2id => {
                let a = settings.argon2;
                argon2::Params::new(a.memory_kib, a.iterations, a.parallelism, None)
                    .map(CredentialHasher::Argon2id)
                    .map_err(|e| AppError::Hashing(format!("argon2 parameters: {e}")))
            },
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        match self {
            CredentialHasher::Scrypt(_) => HashAlgorithm::Scrypt,
            CredentialHasher::Argon2id(_) => HashAlgorithm::Argon2id,
        }
    }

    /// Hash a password under a fresh random salt
    pub fn hash_password(&self, plain: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = match self {
            CredentialHasher::Scrypt(params) => Scrypt
                .hash_password_customized(plain.as_bytes(), None, None, *params, &salt)
                .map(|h| h.to_string()),
            CredentialHasher::Argon2id(params) => {
                Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone())
                    .hash_password(plain.as_bytes(), &salt)
                    .map(|h| h.to_string())
            },
        };
        hash.map_err(|e| AppError::Hashing(e.to_string()))
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        CredentialHasher::Scrypt(scrypt::Params::recommended())
    }
}

/// Verify a password against a stored PHC hash.
///
/// Accepts scrypt and Argon2 hashes whatever the current configuration.
/// The output comparison is constant time. A malformed hash never verifies.
pub fn verify_password(hash: &str, plain: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    let argon2 = Argon2::default();
    let verifiers: [&dyn PasswordVerifier; 2] = [&Scrypt, &argon2];
    parsed_hash.verify_password(&verifiers, plain).is_ok()
}
