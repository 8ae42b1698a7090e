//! Autosave storage for the address form.
//!
//! [`StoreClient`] is the raw key-value surface (the shape of the browser's
//! `localStorage`), and [`LocalStore`] puts the address record on top of it:
//! one JSON document under one fixed key.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::types::AddressRecord;

/// Key the form has always autosaved under.
pub const DEFAULT_STORAGE_KEY: &str = "form-cep-autosave-v1";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("stored address record is malformed: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("failed to serialize address record: {0}")]
    Serialize(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Raw string key-value persistence.
pub trait StoreClient: Send + Sync {
    /// Returns Ok(None) when the key has never been written or was removed.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Replace whatever is stored under `key`.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// In-memory storage for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StoreClient for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items().remove(key);
        Ok(())
    }
}

/// File-per-key storage under a directory.
///
/// Writes go to a sibling temp file and are renamed into place, so a reader
/// never sees a half-written record.
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{}.json", name))
    }
}

impl StoreClient for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(key);
        // Unique per write: the CLI and the server may share a directory.
        let tmp = self.root.join(format!(".{}.tmp", Uuid::new_v4()));
        if let Err(e) = fs::write(&tmp, value).and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// The address record's home in storage.
pub struct LocalStore<S> {
    storage: S,
    key: String,
}

impl<S: StoreClient> LocalStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Stamp `record` with the current time and overwrite the stored copy.
    ///
    /// Returns the record exactly as written.
    pub fn save(&self, record: &AddressRecord) -> Result<AddressRecord> {
        let stamped = AddressRecord {
            saved_at: Some(Utc::now()),
            ..record.clone()
        };
        let json = serde_json::to_string(&stamped).map_err(StoreError::Serialize)?;
        self.storage.set_item(&self.key, &json)?;
        debug!(key = %self.key, cep = %stamped.postal_code, "saved address record");
        Ok(stamped)
    }

    /// Read the stored record.
    ///
    /// An absent or empty value is "no data" (`Ok(None)`); an unparseable one
    /// is [`StoreError::Malformed`].
    pub fn restore(&self) -> Result<Option<AddressRecord>> {
        let Some(raw) = self.storage.get_item(&self.key)? else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(StoreError::Malformed)
    }

    /// Drop the stored record. Failures are logged, never returned.
    pub fn clear(&self) {
        if let Err(e) = self.storage.remove_item(&self.key) {
            warn!(key = %self.key, error = %e, "failed to remove stored address record");
        }
    }
}
