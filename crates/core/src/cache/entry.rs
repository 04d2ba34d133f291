//! Stored cache values.

use serde::{Deserialize, Serialize};

use crate::rank::format::{self, BestMatch, SuggestResult};
use crate::rank::RankedItem;

/// A value under a cache key.
///
/// Serialized untagged: an alias is a bare JSON string holding the target's
/// key suffix, a resolved entry is a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheEntry {
    Alias(String),
    Resolved(ResolvedEntry),
}

/// A fetched and ranked result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEntry {
    /// Expiry in epoch milliseconds.
    pub expires_at: i64,
    pub site_link: String,
    #[serde(default)]
    pub items: Vec<RankedItem>,
    #[serde(default)]
    pub best: Option<BestMatch>,
}

impl ResolvedEntry {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at <= now_ms
    }

    /// The result object for display surfaces.
    pub fn to_result(&self) -> SuggestResult {
        SuggestResult {
            site_link: self.site_link.clone(),
            suggestions: self.items.iter().map(format::suggestion).collect(),
            best: self.best.clone(),
        }
    }
}
