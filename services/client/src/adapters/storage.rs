//! services/client/src/adapters/storage.rs
//!
//! Durable client storage adapters implementing the `KeyValueStore` port.
//! `FileStore` keeps a flat JSON object on disk; `MemoryStore` is the
//! ephemeral variant used for headless runs and tests.

use async_trait::async_trait;
use marketplace_core::ports::{KeyValueStore, PortError, PortResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

//=========================================================================================
// File-backed store
//=========================================================================================

/// A key-value store persisted as a single JSON object file.
pub struct FileStore {
    path: PathBuf,
    // Loaded lazily on first access, then written through on every change.
    entries: Mutex<Option<HashMap<String, String>>>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> PortResult<HashMap<String, String>> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) if raw.is_empty() => Ok(HashMap::new()),
            Ok(raw) => serde_json::from_slice(&raw).map_err(|e| {
                PortError::Storage(format!("corrupt store {}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(PortError::Storage(e.to_string())),
        }
    }

    async fn write_file(&self, entries: &HashMap<String, String>) -> PortResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Storage(e.to_string()))?;
        }
        let raw = serde_json::to_vec_pretty(entries).map_err(|e| PortError::Storage(e.to_string()))?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| PortError::Storage(e.to_string()))?;
        debug!("Wrote {} storage keys to {}", entries.len(), self.path.display());
        Ok(())
    }

    /// Runs `f` against the loaded entries, persisting when it reports a change.
    async fn with_entries<R>(
        &self,
        f: impl FnOnce(&mut HashMap<String, String>) -> (R, bool),
    ) -> PortResult<R> {
        let mut guard = self.entries.lock().await;
        if guard.is_none() {
            *guard = Some(self.read_file().await?);
        }
        let entries = guard
            .as_mut()
            .ok_or_else(|| PortError::Storage("store not loaded".to_string()))?;
        let (result, changed) = f(entries);
        if changed {
            self.write_file(entries).await?;
        }
        Ok(result)
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        self.with_entries(|entries| (entries.get(key).cloned(), false))
            .await
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.with_entries(|entries| {
            let previous = entries.insert(key.to_string(), value.to_string());
            ((), previous.as_deref() != Some(value))
        })
        .await
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.with_entries(|entries| ((), entries.remove(key).is_some()))
            .await
    }
}

//=========================================================================================
// In-memory store
//=========================================================================================

#[derive(Default)]
pub struct MemoryStore {
    entries: std::sync::Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store, e.g. with tokens from a previous run.
    pub fn with_entries<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let entries = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            entries: std::sync::Mutex::new(entries),
        }
    }

    fn lock(&self) -> PortResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| PortError::Storage("memory store poisoned".to_string()))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
