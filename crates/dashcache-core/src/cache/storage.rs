//! Persisted storage media for the cache.
//!
//! A backend is a synchronous key to string store with a finite capacity.
//! Writes that would exceed the capacity are rejected with
//! [`StorageError::QuotaExceeded`] and leave the previous value untouched.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;

/// File extension for entries written by [`FileStorage`].
const ENTRY_EXTENSION: &str = "json";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage quota exceeded: writing {requested} bytes would exceed capacity of {capacity} bytes")]
    QuotaExceeded { requested: u64, capacity: u64 },

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

impl StorageError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded { .. })
    }
}

pub trait StorageBackend: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// All keys currently held, in no particular order.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

fn item_size(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}

// ============================================================================
// In-memory backend
// ============================================================================

/// Volatile backend, mostly for tests and for running without a cache dir.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
    capacity_bytes: Option<u64>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the total of key and value lengths held by this backend.
    pub fn with_capacity_bytes(capacity: u64) -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
            capacity_bytes: Some(capacity),
        }
    }

    pub fn used_bytes(&self) -> u64 {
        self.items
            .lock()
            .map(|items| items.iter().map(|(k, v)| item_size(k, v)).sum())
            .unwrap_or(0)
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;

        if let Some(capacity) = self.capacity_bytes {
            let used: u64 = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| item_size(k, v))
                .sum();
            let requested = item_size(key, value);
            if used + requested > capacity {
                return Err(StorageError::QuotaExceeded { requested, capacity });
            }
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(items.keys().cloned().collect())
    }
}

// ============================================================================
// File backend
// ============================================================================

/// Durable backend storing one file per key inside a directory.
///
/// The directory is expected to be scoped to a single API origin (see
/// `Config::cache_dir`). Keys are percent-encoded into file names.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    capacity_bytes: Option<u64>,
}

impl FileStorage {
    pub fn new(dir: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            capacity_bytes: None,
        })
    }

    pub fn with_capacity_bytes(mut self, capacity: u64) -> Self {
        self.capacity_bytes = Some(capacity);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn item_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", urlencoding::encode(key), ENTRY_EXTENSION))
    }

    fn key_from_path(path: &Path) -> Option<String> {
        if path.extension()? != ENTRY_EXTENSION {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        urlencoding::decode(stem).ok().map(|key| key.into_owned())
    }

    /// Bytes used by every entry except `skip` (the one being replaced).
    fn used_bytes_excluding(&self, skip: &Path) -> Result<u64, StorageError> {
        let mut used = 0;
        for dir_entry in fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            if path == skip {
                continue;
            }
            let Some(key) = Self::key_from_path(&path) else {
                continue;
            };
            used += key.len() as u64 + fs::metadata(&path)?.len();
        }
        Ok(used)
    }
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.item_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.item_path(key);

        if let Some(capacity) = self.capacity_bytes {
            let requested = item_size(key, value);
            let used = self.used_bytes_excluding(&path)?;
            if used + requested > capacity {
                return Err(StorageError::QuotaExceeded { requested, capacity });
            }
        }

        // Write beside the target and rename so a failed write never leaves
        // a truncated entry behind.
        let tmp = path.with_extension("tmp");
        let result = fs::write(&tmp, value).and_then(|_| fs::rename(&tmp, &path));
        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                if e.kind() == ErrorKind::StorageFull {
                    debug!(key = key, "Disk full while writing cache entry");
                    Err(StorageError::QuotaExceeded {
                        requested: item_size(key, value),
                        capacity: self.capacity_bytes.unwrap_or(0),
                    })
                } else {
                    Err(e.into())
                }
            }
        }
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.item_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)? {
            if let Some(key) = Self::key_from_path(&dir_entry?.path()) {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

// ============================================================================
// Tests
// ============================================================================
