//! One-shot expiry alarms keyed by cache key.
//!
//! An alarm deletes its key unconditionally when it fires. Alarms live in the
//! process only; readers still check `expires_at` themselves.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::kv::KvStore;

pub struct ExpiryAlarms<S: KvStore> {
    kv: Arc<S>,
    pending: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl<S: KvStore> ExpiryAlarms<S> {
    pub fn new(kv: Arc<S>) -> Self {
        Self { kv, pending: Mutex::new(HashMap::new()) }
    }

    /// Schedule removal of `key` at `when_ms` (epoch milliseconds).
    ///
    /// Re-creating an alarm for the same key replaces the earlier one.
    pub async fn create(&self, key: &str, when_ms: i64) {
        let delay = Duration::from_millis((when_ms - Utc::now().timestamp_millis()).max(0) as u64);
        let kv = Arc::clone(&self.kv);
        let name = key.to_string();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match kv.remove(vec![name.clone()]).await {
                Ok(n) => tracing::debug!(key = %name, removed = n, "expiry alarm fired"),
                Err(e) => tracing::warn!(key = %name, "expiry alarm failed to remove entry: {e}"),
            }
        });

        let mut pending = self.pending.lock().await;
        pending.retain(|_, h| !h.is_finished());
        if let Some(old) = pending.insert(key.to_string(), handle) {
            old.abort();
        }
    }

    /// Number of alarms that have not fired yet.
    pub async fn pending(&self) -> usize {
        self.pending.lock().await.values().filter(|h| !h.is_finished()).count()
    }
}

impl<S: KvStore> Drop for ExpiryAlarms<S> {
    fn drop(&mut self) {
        for handle in self.pending.get_mut().values() {
            handle.abort();
        }
    }
}
