//! cache_purge tool implementation.
//!
//! Removes expired suggestion entries and aliases left without a target.

use chrono::Utc;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use omnisuggest_core::{CacheStore, KvStore};

use crate::tools::json_result;

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of entries deleted.
    pub deleted: u64,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl<S: KvStore>(cache: &CacheStore<S>) -> Result<CallToolResult, McpError> {
    let deleted = cache.purge_expired(Utc::now().timestamp_millis()).await?;
    Ok(json_result(&CachePurgeOutput { deleted })?)
}
