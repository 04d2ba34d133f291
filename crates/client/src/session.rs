//! Search session for one omnibox.
//!
//! Owns the normalizer and the fetch orchestrator, and turns raw keystrokes
//! into display-ready suggestions.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use omnisuggest_core::rank::format;
use omnisuggest_core::rank::{BestMatch, Suggestion};
use omnisuggest_core::{AppConfig, CacheStore, Error, KvStore, Normalizer};

use crate::api::Transport;
use crate::image;
use crate::orchestrator::FetchOrchestrator;

/// What the display surface shows for one keystroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputOutcome {
    /// Summary line: the cooked site link, or the plain "search on site" text.
    pub default_description: String,
    pub suggestions: Vec<Suggestion>,
    pub best: Option<BestMatch>,
}

pub struct SearchSession<T: Transport, S: KvStore> {
    normalizer: Normalizer,
    orchestrator: FetchOrchestrator<T, S>,
}

impl<T: Transport, S: KvStore> SearchSession<T, S> {
    pub fn new(config: &AppConfig, transport: Arc<T>, kv: Arc<S>) -> Result<Self, Error> {
        let normalizer = Normalizer::new(&config.site)?;
        let cache = CacheStore::from_config(kv, config);
        let orchestrator = FetchOrchestrator::new(transport, cache, config);
        Ok(Self { normalizer, orchestrator })
    }

    pub fn orchestrator(&self) -> &FetchOrchestrator<T, S> {
        &self.orchestrator
    }

    pub fn cache(&self) -> &CacheStore<S> {
        self.orchestrator.cache()
    }

    /// Description shown before anything is typed.
    pub fn idle_description(&self) -> String {
        format::open_site(&self.normalizer.site().site_url)
    }

    /// Handle one edit of the input text.
    pub async fn on_input_changed(&self, raw: &str) -> InputOutcome {
        let query = self.normalizer.parse(raw);
        self.orchestrator.observe(&query.text).await;

        if query.is_empty() {
            self.orchestrator.cancel().await;
            return InputOutcome { default_description: self.idle_description(), suggestions: Vec::new(), best: None };
        }

        match self.orchestrator.search(&query).await {
            Some(entry) => {
                let result = entry.to_result();
                InputOutcome {
                    default_description: result.site_link,
                    suggestions: result.suggestions,
                    best: result.best,
                }
            }
            None => InputOutcome {
                default_description: format::search_on_site(&query.text),
                suggestions: Vec::new(),
                best: None,
            },
        }
    }

    /// The input was dismissed.
    pub async fn cancel(&self) {
        self.orchestrator.cancel().await;
    }

    /// Destination URL for committed input.
    pub fn commit_url(&self, raw: &str) -> String {
        self.normalizer.parse(raw).destination_url(self.normalizer.site())
    }

    /// Inline image for a best-match notification. Failures yield `None`.
    pub async fn image_data(&self, url: &str) -> Option<String> {
        let transport = self.orchestrator.transport();
        match image::fetch_data_uri(transport.as_ref(), url, &CancellationToken::new()).await {
            Ok(uri) => Some(uri),
            Err(e) => {
                tracing::warn!(url = %url, "best match image unavailable: {e}");
                None
            }
        }
    }
}
