//! Key/value storage capability behind the suggestion cache.
//!
//! Values are opaque JSON text at this level. Each key is read and written
//! atomically on its own; batches are independent single-key writes.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::Error;

/// Persistent key/value store used by [`super::CacheStore`].
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Read one key.
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Read every entry, for eviction scans.
    async fn get_all(&self) -> Result<Vec<(String, String)>, Error>;

    /// Write a batch of entries.
    async fn set(&self, entries: Vec<(String, String)>) -> Result<(), Error>;

    /// Remove keys, returning how many existed.
    async fn remove(&self, keys: Vec<String>) -> Result<u64, Error>;

    /// Total bytes of all keys and values.
    async fn bytes_in_use(&self) -> Result<u64, Error>;
}

/// In-process store. Contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.lock().await.contains_key(key)
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn get_all(&self) -> Result<Vec<(String, String)>, Error> {
        Ok(self.entries.lock().await.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    async fn set(&self, entries: Vec<(String, String)>) -> Result<(), Error> {
        self.entries.lock().await.extend(entries);
        Ok(())
    }

    async fn remove(&self, keys: Vec<String>) -> Result<u64, Error> {
        let mut map = self.entries.lock().await;
        Ok(keys.iter().filter(|k| map.remove(k.as_str()).is_some()).count() as u64)
    }

    async fn bytes_in_use(&self) -> Result<u64, Error> {
        let map = self.entries.lock().await;
        Ok(map.iter().map(|(k, v)| (k.len() + v.len()) as u64).sum())
    }
}
