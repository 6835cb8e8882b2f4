//! Key-value store implementations and JSON helpers.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use coursegate_contracts::error::{CoursegateError, CoursegateResult};

use crate::traits::KeyValueStore;

/// Read and decode the JSON value under `key`.
pub fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> CoursegateResult<Option<T>> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode `value` as JSON and store it under `key`.
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> CoursegateResult<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

// ── MemoryStore ───────────────────────────────────────────────────────────────

/// A process-local store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> CoursegateResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.inner.lock().map_err(|e| CoursegateError::StorageFailed {
            reason: format!("memory store lock poisoned: {}", e),
        })
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> CoursegateResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CoursegateResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CoursegateResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

// ── JsonFileStore ─────────────────────────────────────────────────────────────

/// A directory-backed store: each key lives in `<dir>/<key>.json`.
///
/// Keys are restricted to `[A-Za-z0-9_-]` so they map to plain file names.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and create if needed) the store directory.
    pub fn open(dir: impl AsRef<Path>) -> CoursegateResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| CoursegateError::StorageFailed {
            reason: format!("failed to create store directory '{}': {}", dir.display(), e),
        })?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> CoursegateResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(CoursegateError::StorageFailed {
                reason: format!("invalid storage key '{}'", key),
            });
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> CoursegateResult<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoursegateError::StorageFailed {
                reason: format!("failed to read '{}': {}", path.display(), e),
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> CoursegateResult<()> {
        let path = self.path_for(key)?;
        debug!(key = %key, bytes = value.len(), "writing store key");
        std::fs::write(&path, value).map_err(|e| CoursegateError::StorageFailed {
            reason: format!("failed to write '{}': {}", path.display(), e),
        })
    }

    fn remove(&self, key: &str) -> CoursegateResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoursegateError::StorageFailed {
                reason: format!("failed to remove '{}': {}", path.display(), e),
            }),
        }
    }
}
