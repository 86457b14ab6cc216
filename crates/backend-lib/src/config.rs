// ============================
// credgate-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use axum::http::HeaderValue;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::credential::CredentialHasher;

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "credgate.toml";

/// Prefix of environment overrides, nested keys split on `__`
pub const ENV_PREFIX: &str = "CREDGATE_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level
    pub log_level: String,
    /// Cross-origin policy
    pub cors: CorsSettings,
    /// Credential store backend
    pub store: StoreSettings,
    /// Password hashing algorithm and cost
    pub hashing: HashSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsSettings {
    /// The only origin allowed to make credentialed requests
    pub allowed_origin: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// JSON documents appended to `users.jsonl` under `data_dir`
    File,
    /// In-process only, lost on restart
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    /// Data directory path
    pub data_dir: PathBuf,
    /// Reject a second registration under an existing username
    pub unique_usernames: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Scrypt,
    Argon2id,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashSettings {
    /// Algorithm used for new hashes; existing hashes verify with whatever they name
    pub algorithm: HashAlgorithm,
    pub scrypt: ScryptSettings,
    pub argon2: Argon2Settings,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScryptSettings {
    /// log2 of the CPU/memory cost
    pub log_n: u8,
    /// Block size
    pub r: u32,
    /// Parallelization
    pub p: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Argon2Settings {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            log_level: "info".to_string(),
            cors: CorsSettings::default(),
            store: StoreSettings::default(),
            hashing: HashSettings::default(),
        }
    }
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origin: "http://localhost:5173".to_string(),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            data_dir: PathBuf::from("data"),
            unique_usernames: false,
        }
    }
}

impl Default for HashSettings {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Scrypt,
            scrypt: ScryptSettings::default(),
            argon2: Argon2Settings::default(),
        }
    }
}

impl Default for ScryptSettings {
    fn default() -> Self {
        Self { log_n: 17, r: 8, p: 1 }
    }
}

impl Default for Argon2Settings {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

impl Settings {
    /// Load settings from `credgate.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::figment(Toml::file(DEFAULT_CONFIG_FILE))
            .extract()
            .context("Failed to load settings")
    }

    /// Load settings from an explicit file, which must exist
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("Config file {} does not exist", path.display());
        }
        Self::figment(Toml::file(path))
            .extract()
            .with_context(|| format!("Failed to load settings from {}", path.display()))
    }

    fn figment(file: figment::providers::Data<Toml>) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Check the values serde cannot
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!("Invalid log level: {}", self.log_level);
        }
        self.allowed_origin()?;
        // both parameter sets, whichever algorithm is selected
        for algorithm in [HashAlgorithm::Scrypt, HashAlgorithm::Argon2id] {
            let hashing = HashSettings {
                algorithm,
                ..self.hashing.clone()
            };
            CredentialHasher::from_settings(&hashing)
                .map_err(|e| anyhow::anyhow!("Invalid hashing parameters: {e}"))?;
        }
        Ok(())
    }

    /// The configured CORS origin as a header value
    pub fn allowed_origin(&self) -> Result<HeaderValue> {
        let origin = self.cors.allowed_origin.trim_end_matches('/');
        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            bail!("Invalid CORS origin: {}", self.cors.allowed_origin);
        }
        HeaderValue::from_str(origin)
            .with_context(|| format!("Invalid CORS origin: {}", self.cors.allowed_origin))
    }
}
