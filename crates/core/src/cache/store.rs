//! Suggestion cache: alias chasing, alias back-fill, quota eviction.
//!
//! Keys look like `input:onizuka/a`. A canonical key holds a resolved entry;
//! shorter prefixes typed on the way there hold an alias naming the
//! canonical key's suffix.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::alarms::ExpiryAlarms;
use super::entry::{CacheEntry, ResolvedEntry};
use super::kv::KvStore;
use crate::Error;
use crate::config::AppConfig;

pub struct CacheStore<S: KvStore> {
    kv: Arc<S>,
    prefix: String,
    quota: u64,
    alarms: ExpiryAlarms<S>,
}

impl<S: KvStore> CacheStore<S> {
    pub fn new(kv: Arc<S>, prefix: impl Into<String>, quota: u64) -> Self {
        let alarms = ExpiryAlarms::new(Arc::clone(&kv));
        Self { kv, prefix: prefix.into(), quota, alarms }
    }

    pub fn from_config(kv: Arc<S>, config: &AppConfig) -> Self {
        Self::new(kv, config.key_prefix.clone(), config.storage_quota)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn alarms(&self) -> &ExpiryAlarms<S> {
        &self.alarms
    }

    /// Full key for a key suffix.
    pub fn key_for(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.prefix)
    }

    /// Read and decode one key without following aliases.
    pub async fn read(&self, key: &str) -> Result<Option<CacheEntry>, Error> {
        match self.kv.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Follow aliases from `key` to a resolved entry.
    ///
    /// Expired entries are returned as is. A missing target, a cycle, a
    /// malformed value or a storage error all resolve to `None`.
    pub async fn resolve(&self, key: &str) -> Option<ResolvedEntry> {
        let mut key = key.to_string();
        let mut visited = HashSet::new();

        loop {
            if !visited.insert(key.clone()) {
                tracing::warn!(key = %key, "alias cycle in cache");
                return None;
            }
            match self.read(&key).await {
                Ok(Some(CacheEntry::Resolved(entry))) => return Some(entry),
                Ok(Some(CacheEntry::Alias(target))) => key = self.key_for(&target),
                Ok(None) => return None,
                Err(e) => {
                    tracing::warn!(key = %key, "cache read failed, treating as miss: {e}");
                    return None;
                }
            }
        }
    }

    /// Write a resolved entry under its canonical key.
    pub async fn put(&self, key: &str, entry: &ResolvedEntry) -> Result<(), Error> {
        let value = serde_json::to_string(&CacheEntry::Resolved(entry.clone()))?;
        self.kv.set(vec![(key.to_string(), value)]).await?;
        self.evict_logged().await;
        Ok(())
    }

    /// Point every key in `keys` at `canonical_suffix`.
    pub async fn put_aliases(&self, keys: &[String], canonical_suffix: &str) -> Result<(), Error> {
        if keys.is_empty() {
            return Ok(());
        }
        let value = serde_json::to_string(&CacheEntry::Alias(canonical_suffix.to_string()))?;
        let batch = keys.iter().map(|k| (k.clone(), value.clone())).collect();
        self.kv.set(batch).await?;
        self.evict_logged().await;
        Ok(())
    }

    async fn evict_logged(&self) {
        if let Err(e) = self.evict_if_over_quota().await {
            tracing::warn!("cache eviction failed: {e}");
        }
    }

    /// Past half the quota, delete the older half of the entries by expiry.
    ///
    /// Only keys under this store's prefix are considered. An alias sorts
    /// with the entry it points at; aliases without a resolved target and
    /// undecodable values sort as oldest. Returns the number removed.
    pub async fn evict_if_over_quota(&self) -> Result<u64, Error> {
        let used = self.kv.bytes_in_use().await?;
        if used.saturating_mul(2) <= self.quota {
            return Ok(0);
        }

        let mut expiries = HashMap::new();
        let mut aliases = Vec::new();
        let mut ordered: Vec<(i64, String)> = Vec::new();

        for (key, raw) in self.kv.get_all().await? {
            if !key.starts_with(&self.prefix) {
                continue;
            }
            match serde_json::from_str::<CacheEntry>(&raw) {
                Ok(CacheEntry::Resolved(entry)) => {
                    expiries.insert(key.clone(), entry.expires_at);
                    ordered.push((entry.expires_at, key));
                }
                Ok(CacheEntry::Alias(target)) => aliases.push((key, self.key_for(&target))),
                Err(_) => ordered.push((i64::MIN, key)),
            }
        }
        ordered.extend(
            aliases
                .into_iter()
                .map(|(key, target)| (expiries.get(&target).copied().unwrap_or(i64::MIN), key)),
        );
        ordered.sort();

        let half = ordered.len() / 2;
        let victims: Vec<String> = ordered.into_iter().take(half).map(|(_, key)| key).collect();
        let removed = self.kv.remove(victims).await?;
        tracing::info!(
            bytes_in_use = used,
            quota = self.quota,
            removed,
            "cache over half quota, evicted oldest entries"
        );
        Ok(removed)
    }

    /// Register the expiry backstop for `key`.
    pub async fn schedule_expiry(&self, key: &str, when_ms: i64) {
        self.alarms.create(key, when_ms).await;
    }

    /// Remove expired entries, undecodable values and aliases whose target is
    /// no longer a live entry. Returns the number removed.
    pub async fn purge_expired(&self, now_ms: i64) -> Result<u64, Error> {
        let mut live = HashSet::new();
        let mut aliases = Vec::new();
        let mut doomed = Vec::new();

        for (key, raw) in self.kv.get_all().await? {
            if !key.starts_with(&self.prefix) {
                continue;
            }
            match serde_json::from_str::<CacheEntry>(&raw) {
                Ok(CacheEntry::Resolved(entry)) if !entry.is_expired(now_ms) => {
                    live.insert(key);
                }
                Ok(CacheEntry::Alias(target)) => aliases.push((key, self.key_for(&target))),
                _ => doomed.push(key),
            }
        }

        doomed.extend(aliases.into_iter().filter(|(_, target)| !live.contains(target)).map(|(key, _)| key));

        if doomed.is_empty() {
            return Ok(0);
        }
        let removed = self.kv.remove(doomed).await?;
        tracing::info!(removed, "purged stale cache entries");
        Ok(removed)
    }
}
