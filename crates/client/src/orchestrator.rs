//! Debounced, cancelable fetch orchestration.
//!
//! One orchestrator serves one query surface. Every [`FetchOrchestrator::search`]
//! call cancels the pending one first, so at most one request is in flight
//! and a superseded call always resolves to `None`.
//!
//! Per call: cache lookup, debounce, fetch, rank, store. A fresh cache hit
//! skips the debounce and the network entirely unless the query is forced.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use omnisuggest_core::rank::{self, Found};
use omnisuggest_core::{AppConfig, CacheStore, KvStore, PrefixChain, Query, ResolvedEntry, SiteProfile};

use crate::api::Transport;

pub struct FetchOrchestrator<T: Transport, S: KvStore> {
    transport: Arc<T>,
    cache: CacheStore<S>,
    site: SiteProfile,
    delay: Duration,
    ttl: chrono::Duration,
    chain: Mutex<PrefixChain>,
    pending: Mutex<Option<CancellationToken>>,
}

impl<T: Transport, S: KvStore> FetchOrchestrator<T, S> {
    pub fn new(transport: Arc<T>, cache: CacheStore<S>, config: &AppConfig) -> Self {
        Self {
            transport,
            cache,
            site: config.site.clone(),
            delay: config.request_delay(),
            ttl: config.cache_ttl(),
            chain: Mutex::new(PrefixChain::new()),
            pending: Mutex::new(None),
        }
    }

    pub fn cache(&self) -> &CacheStore<S> {
        &self.cache
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Record normalized text in the prefix chain.
    pub async fn observe(&self, text: &str) {
        self.chain.lock().await.observe(text);
    }

    pub async fn chain(&self) -> PrefixChain {
        self.chain.lock().await.clone()
    }

    /// Abort the pending debounce or request, if any.
    pub async fn cancel(&self) {
        if let Some(token) = self.pending.lock().await.take() {
            token.cancel();
        }
    }

    /// Cancel whatever is pending and install a token for a new search.
    async fn supersede(&self) -> CancellationToken {
        let mut pending = self.pending.lock().await;
        if let Some(old) = pending.take() {
            old.cancel();
        }
        let token = CancellationToken::new();
        *pending = Some(token.clone());
        token
    }

    /// Resolve suggestions for `query`.
    ///
    /// Returns `None` when superseded, cancelled, or when the request or the
    /// response fails. Failures are logged, never returned.
    pub async fn search(&self, query: &Query) -> Option<ResolvedEntry> {
        let token = self.supersede().await;
        let key = query.cache_key(self.cache.prefix());

        if let Some(entry) = self.cache.resolve(&key).await {
            if !query.force && !entry.is_expired(Utc::now().timestamp_millis()) {
                tracing::debug!(key = %key, "cache hit");
                return Some(entry);
            }
            tracing::debug!(key = %key, force = query.force, "cached entry stale or bypassed");
        } else {
            tracing::debug!(key = %key, "cache miss");
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!(key = %key, "superseded during debounce");
                return None;
            }
            _ = tokio::time::sleep(self.delay) => {}
        }

        let url = query.api_url(&self.site);
        let start = Instant::now();
        let body = match self.transport.fetch_json(&url, &token).await {
            Ok(body) => body,
            Err(e) if e.is_cancelled() => {
                tracing::debug!(key = %key, "request aborted");
                return None;
            }
            Err(e) => {
                tracing::warn!(key = %key, "prefix search failed: {e}");
                return None;
            }
        };

        if token.is_cancelled() {
            tracing::debug!(key = %key, "response arrived after supersession, dropped");
            return None;
        }

        let found: Found = match serde_json::from_value(body) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(key = %key, "unexpected prefix search response: {e}");
                return None;
            }
        };

        tracing::debug!(key = %key, "prefix search completed in {:?}", start.elapsed());

        let expires_at = Utc::now().timestamp_millis().saturating_add(self.ttl.num_milliseconds());
        let entry = rank::cook(found, query, expires_at);
        self.store(query, &key, &entry, &token).await;

        if token.is_cancelled() {
            tracing::debug!(key = %key, "superseded while storing, result kept in cache only");
            return None;
        }
        Some(entry)
    }

    /// Write the canonical entry, alias the typed prefixes to it, and arm the
    /// expiry alarm. Store failures only cost future cache hits.
    ///
    /// Once `token` is cancelled the prefix chain belongs to the newer search,
    /// so no aliases are taken from it.
    async fn store(&self, query: &Query, key: &str, entry: &ResolvedEntry, token: &CancellationToken) {
        if let Err(e) = self.cache.put(key, entry).await {
            tracing::warn!(key = %key, "failed to cache result: {e}");
            return;
        }
        self.cache.schedule_expiry(key, entry.expires_at).await;

        if token.is_cancelled() {
            return;
        }

        let aliases: Vec<String> = self
            .chain
            .lock()
            .await
            .take_collapsed(&query.text)
            .into_iter()
            .map(|prefix| self.cache.key_for(&format!("{prefix}{}", query.category_key)))
            .collect();

        if let Err(e) = self.cache.put_aliases(&aliases, &query.cache_suffix()).await {
            tracing::warn!(key = %key, aliases = aliases.len(), "failed to write prefix aliases: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedTransport, anime};
    use omnisuggest_core::{CacheEntry, MemoryStore, Normalizer};

    struct Harness {
        kv: Arc<MemoryStore>,
        transport: Arc<ScriptedTransport>,
        orchestrator: FetchOrchestrator<ScriptedTransport, MemoryStore>,
        normalizer: Normalizer,
    }

    fn harness(transport: ScriptedTransport) -> Harness {
        let config = AppConfig::default();
        let kv = Arc::new(MemoryStore::new());
        let transport = Arc::new(transport);
        let cache = CacheStore::from_config(Arc::clone(&kv), &config);
        let orchestrator = FetchOrchestrator::new(Arc::clone(&transport), cache, &config);
        let normalizer = Normalizer::new(&config.site).unwrap();
        Harness { kv, transport, orchestrator, normalizer }
    }

    impl Harness {
        async fn search(&self, raw: &str) -> Option<ResolvedEntry> {
            let query = self.normalizer.parse(raw);
            self.orchestrator.observe(&query.text).await;
            self.orchestrator.search(&query).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_after_debounce_and_ranks() {
        let h = harness(ScriptedTransport::ok(anime(&["Naruto: Shippuden", "Naruto"])));

        let entry = h.search("naruto").await.unwrap();

        assert_eq!(h.transport.requests().len(), 1);
        assert!(h.transport.requests()[0].contains("type=all"));
        assert!(h.transport.requests()[0].ends_with("keyword=naruto"));
        assert_eq!(entry.items[0].name, "Naruto");
        assert_eq!(entry.items[1].name, "Naruto: Shippuden");
        assert!(h.kv.contains("input:naruto").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_supersedes_earlier_call() {
        let h = harness(ScriptedTransport::ok(anime(&["Abara"])));

        let (first, second) = tokio::join!(h.search("a"), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            h.search("ab").await
        });

        assert!(first.is_none());
        assert!(second.is_some());
        let requests = h.transport.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].ends_with("keyword=ab"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_prefix_aliases_written_after_fetch() {
        let h = harness(ScriptedTransport::ok(anime(&["Great Teacher Onizuka"])));

        let (first, second) = tokio::join!(h.search("oni"), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            h.search("onizuka").await
        });

        assert!(first.is_none());
        assert!(second.is_some());
        assert_eq!(h.transport.requests().len(), 1);

        let cache = h.orchestrator.cache();
        assert_eq!(cache.read("input:oni").await.unwrap(), Some(CacheEntry::Alias("onizuka".into())));
        assert!(matches!(cache.read("input:onizuka").await.unwrap(), Some(CacheEntry::Resolved(_))));
        assert!(h.orchestrator.chain().await.is_empty());

        // the alias now answers without a request
        assert!(h.search("oni").await.is_some());
        assert_eq!(h.transport.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_category_suffix_in_alias_keys() {
        let h = harness(ScriptedTransport::ok(anime(&["Bleach"])));

        h.orchestrator.observe("ble").await;
        let query = h.normalizer.parse("bleach/A");
        h.orchestrator.observe(&query.text).await;
        assert!(h.orchestrator.search(&query).await.is_some());

        assert!(h.transport.requests()[0].contains("type=anime"));
        let cache = h.orchestrator.cache();
        assert_eq!(cache.read("input:ble/a").await.unwrap(), Some(CacheEntry::Alias("bleach/a".into())));
        assert!(cache.resolve("input:bleach/a").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_cache_hit_skips_network() {
        let h = harness(ScriptedTransport::ok(anime(&["Bleach"])));
        let fresh = ResolvedEntry {
            expires_at: Utc::now().timestamp_millis() + 60_000,
            site_link: "cached".into(),
            items: Vec::new(),
            best: None,
        };
        h.orchestrator.cache().put("input:bleach", &fresh).await.unwrap();

        let entry = h.search("bleach").await.unwrap();
        assert_eq!(entry.site_link, "cached");
        assert!(h.transport.requests().is_empty());

        let forced = h.search("bleach!").await.unwrap();
        assert_ne!(forced.site_link, "cached");
        assert_eq!(h.transport.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_refetched() {
        let h = harness(ScriptedTransport::ok(anime(&["Bleach"])));
        let stale = ResolvedEntry {
            expires_at: Utc::now().timestamp_millis() - 1_000,
            site_link: "stale".into(),
            items: Vec::new(),
            best: None,
        };
        h.orchestrator.cache().put("input:bleach", &stale).await.unwrap();

        let entry = h.search("bleach").await.unwrap();

        assert_eq!(h.transport.requests().len(), 1);
        assert_eq!(entry.items[0].name, "Bleach");
        assert!(entry.expires_at > Utc::now().timestamp_millis());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_aborts_in_flight_request() {
        let h = harness(ScriptedTransport::ok(anime(&["Naruto"])).with_latency(Duration::from_secs(5)));

        let (result, ()) = tokio::join!(h.search("naruto"), async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            h.orchestrator.cancel().await;
        });

        assert!(result.is_none());
        assert_eq!(h.transport.requests().len(), 1);
        assert_eq!(h.kv.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_http_failure_degrades_to_none() {
        let h = harness(ScriptedTransport::failing(503));

        assert!(h.search("naruto").await.is_none());
        assert_eq!(h.transport.requests().len(), 1);
        assert_eq!(h.kv.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_body_degrades_to_none() {
        let h = harness(ScriptedTransport::ok(serde_json::json!({"categories": "nope"})));
        assert!(h.search("naruto").await.is_none());
    }

    /// Delegates to a [`MemoryStore`] but takes a second per write.
    struct SlowStore {
        inner: Arc<MemoryStore>,
    }

    #[async_trait::async_trait]
    impl KvStore for SlowStore {
        async fn get(&self, key: &str) -> Result<Option<String>, omnisuggest_core::Error> {
            self.inner.get(key).await
        }

        async fn get_all(&self) -> Result<Vec<(String, String)>, omnisuggest_core::Error> {
            self.inner.get_all().await
        }

        async fn set(&self, items: Vec<(String, String)>) -> Result<(), omnisuggest_core::Error> {
            tokio::time::sleep(Duration::from_secs(1)).await;
            self.inner.set(items).await
        }

        async fn remove(&self, keys: Vec<String>) -> Result<u64, omnisuggest_core::Error> {
            self.inner.remove(keys).await
        }

        async fn bytes_in_use(&self) -> Result<u64, omnisuggest_core::Error> {
            self.inner.bytes_in_use().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_while_storing_returns_none() {
        let config = AppConfig::default();
        let inner = Arc::new(MemoryStore::new());
        let fresh = ResolvedEntry {
            expires_at: Utc::now().timestamp_millis() + 3_600_000,
            site_link: "cached".into(),
            items: Vec::new(),
            best: None,
        };
        inner
            .set(vec![("input:bleach".into(), serde_json::to_string(&CacheEntry::Resolved(fresh)).unwrap())])
            .await
            .unwrap();

        let cache = CacheStore::new(Arc::new(SlowStore { inner: Arc::clone(&inner) }), "input:", u64::MAX);
        let transport = Arc::new(ScriptedTransport::ok(anime(&["Naruto"])));
        let orchestrator = FetchOrchestrator::new(Arc::clone(&transport), cache, &config);
        let normalizer = Normalizer::new(&config.site).unwrap();

        let (first, second) = tokio::join!(
            async {
                let query = normalizer.parse("naruto");
                orchestrator.observe(&query.text).await;
                orchestrator.search(&query).await
            },
            async {
                // the first search is inside its slow write by now
                tokio::time::sleep(Duration::from_millis(500)).await;
                let query = normalizer.parse("bleach");
                orchestrator.observe(&query.text).await;
                orchestrator.search(&query).await
            }
        );

        assert!(first.is_none());
        assert_eq!(second.unwrap().site_link, "cached");
        assert_eq!(transport.requests().len(), 1);
        assert!(inner.contains("input:naruto").await);
        assert_eq!(orchestrator.chain().await.entries(), ["bleach"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_alarm_armed() {
        let h = harness(ScriptedTransport::ok(anime(&["Naruto"])));
        h.search("naruto").await.unwrap();
        assert_eq!(h.orchestrator.cache().alarms().pending().await, 1);
    }
}
