// ============================
// credgate-lib/src/storage.rs
// ============================
//! Credential store abstraction with in-memory and flat-file implementations.
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{fs as tokio_fs, io::AsyncWriteExt, sync::Mutex};
use tracing::warn;
use uuid::Uuid;

use crate::config::{StoreBackend, StoreSettings};

/// File holding one credential document per line
pub const CREDENTIALS_FILE: &str = "users.jsonl";

/// One persisted credential
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    /// Opaque identifier assigned on insert
    pub id: String,
    pub username: String,
    /// PHC string, never the plaintext
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl StoredCredential {
    fn new(username: &str, password_hash: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt credential document at line {line}: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Username already registered: {0}")]
    DuplicateUsername(String),
}

/// Trait for credential storage backends
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist a new credential and return it with its assigned id
    async fn insert(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<StoredCredential, StoreError>;

    /// First credential stored under `username`, in insertion order
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredential>, StoreError>;

    /// Number of stored credentials
    async fn len(&self) -> Result<usize, StoreError>;
}

/// Open the backend named in the settings
pub fn open_store(settings: &StoreSettings) -> anyhow::Result<Arc<dyn CredentialStore>> {
    let store: Arc<dyn CredentialStore> = match settings.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new(settings.unique_usernames)),
        StoreBackend::File => Arc::new(
            FileStore::new(&settings.data_dir, settings.unique_usernames).with_context(|| {
                format!("Failed to open credential store at {}", settings.data_dir.display())
            })?,
        ),
    };
    Ok(store)
}

/// In-process store keyed by username
#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<String, Vec<StoredCredential>>,
    unique_usernames: bool,
}

impl MemoryStore {
    pub fn new(unique_usernames: bool) -> Self {
        Self {
            records: DashMap::new(),
            unique_usernames,
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn insert(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<StoredCredential, StoreError> {
        // the entry guard holds the shard lock across check and push
        let mut entry = self.records.entry(username.to_string()).or_default();
        if self.unique_usernames && !entry.is_empty() {
            return Err(StoreError::DuplicateUsername(username.to_string()));
        }
        let record = StoredCredential::new(username, password_hash);
        entry.push(record.clone());
        Ok(record)
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredential>, StoreError> {
        Ok(self
            .records
            .get(username)
            .and_then(|records| records.first().cloned()))
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.records.iter().map(|entry| entry.value().len()).sum())
    }
}

/// Flat-file document store: one JSON document per line in `users.jsonl`.
///
/// Writers are serialized by `lock`; readers never take it.
pub struct FileStore {
    path: PathBuf,
    unique_usernames: bool,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(root: P, unique_usernames: bool) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            path: root.join(CREDENTIALS_FILE),
            unique_usernames,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_bytes(&self) -> Result<Vec<u8>, StoreError> {
        match tokio_fs::read(&self.path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read every newline-terminated document.
    ///
    /// A last line without its newline is either an append in flight or one
    /// cut short, and is skipped.
    async fn read_all(&self) -> Result<Vec<StoredCredential>, StoreError> {
        let content = self.read_bytes().await?;
        let complete_len = content
            .iter()
            .rposition(|b| *b == b'\n')
            .map_or(0, |idx| idx + 1);
        let (complete, torn) = content.split_at(complete_len);
        if !torn.iter().all(u8::is_ascii_whitespace) {
            warn!(
                path = %self.path.display(),
                bytes = torn.len(),
                "skipping unterminated credential document"
            );
        }

        let complete = std::str::from_utf8(complete).map_err(std::io::Error::other)?;
        complete
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str(line).map_err(|source| StoreError::Corrupt {
                    line: idx + 1,
                    source,
                })
            })
            .collect()
    }

    /// Cut an unterminated last line so the next append starts a fresh one.
    /// Callers hold `lock`.
    async fn truncate_torn_tail(&self) -> Result<(), StoreError> {
        let content = self.read_bytes().await?;
        if content.last().map_or(true, |b| *b == b'\n') {
            return Ok(());
        }

        let keep = content
            .iter()
            .rposition(|b| *b == b'\n')
            .map_or(0, |idx| idx + 1);
        warn!(
            path = %self.path.display(),
            bytes = content.len() - keep,
            "truncating unterminated credential document"
        );
        let file = tokio_fs::OpenOptions::new()
            .write(true)
            .open(&self.path)
            .await?;
        file.set_len(keep as u64).await?;
        file.sync_data().await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn insert(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<StoredCredential, StoreError> {
        let _guard = self.lock.lock().await;
        self.truncate_torn_tail().await?;

        if self.unique_usernames
            && self
                .read_all()
                .await?
                .iter()
                .any(|record| record.username == username)
        {
            return Err(StoreError::DuplicateUsername(username.to_string()));
        }

        let record = StoredCredential::new(username, password_hash);
        let mut line = serde_json::to_string(&record).map_err(std::io::Error::other)?;
        line.push('\n');

        let mut file = tokio_fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.sync_data().await?;

        Ok(record)
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredential>, StoreError> {
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .find(|record| record.username == username))
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read_all().await?.len())
    }
}
