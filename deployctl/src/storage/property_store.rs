//! Shared key-value store for harvested application properties

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::errors::DeployError;
use crate::filesys::file::File;

/// Key-value configuration store
///
/// Writers go through [`PropertyStore::upsert_all`], which applies a whole
/// batch or nothing.
#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Insert or overwrite every entry; later duplicates win
    async fn upsert_all(&self, entries: &[(String, String)]) -> Result<(), DeployError>;

    async fn get(&self, key: &str) -> Result<Option<String>, DeployError>;

    /// All stored values
    async fn entries(&self) -> Result<BTreeMap<String, String>, DeployError>;
}

/// JSON file backed store
///
/// Read-modify-write happens under a single-writer lock and is persisted with
/// write-to-temp and rename. Writers in other processes are not serialized.
pub struct FilePropertyStore {
    file: File,
    lock: Mutex<()>,
}

impl FilePropertyStore {
    pub fn new(file: File) -> Self {
        Self {
            file,
            lock: Mutex::new(()),
        }
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, DeployError> {
        if !self.file.exists().await {
            return Ok(BTreeMap::new());
        }
        self.file.read_json().await
    }
}

#[async_trait]
impl PropertyStore for FilePropertyStore {
    async fn upsert_all(&self, entries: &[(String, String)]) -> Result<(), DeployError> {
        let _guard = self.lock.lock().await;

        let mut values = self.load().await?;
        for (key, value) in entries {
            values.insert(key.clone(), value.clone());
        }

        self.file.write_json(&values).await?;
        debug!(
            "Stored {} properties in {}",
            entries.len(),
            self.file.path().display()
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, DeployError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn entries(&self) -> Result<BTreeMap<String, String>, DeployError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }
}

/// Process-local store, used when no file is wanted
#[derive(Default)]
pub struct MemoryPropertyStore {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemoryPropertyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PropertyStore for MemoryPropertyStore {
    async fn upsert_all(&self, entries: &[(String, String)]) -> Result<(), DeployError> {
        let mut values = self.values.write().await;
        for (key, value) in entries {
            values.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, DeployError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn entries(&self) -> Result<BTreeMap<String, String>, DeployError> {
        Ok(self.values.read().await.clone())
    }
}
