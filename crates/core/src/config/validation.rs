//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Longest accepted cache lifetime: one year.
pub const MAX_CACHE_TTL_MS: u64 = 365 * 24 * 60 * 60 * 1000;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` for an empty `key_prefix` or `site.site_url`,
    /// and `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `request_delay_ms` exceeds 5 seconds
    /// - `cache_ttl_ms` is under one second or over one year
    /// - `storage_quota` is 0
    /// - `user_agent` is empty
    /// - `site.api_url` has no `%t` placeholder
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key_prefix.is_empty() {
            return Err(ConfigError::Missing {
                field: "key_prefix".into(),
                hint: "Set OMNISUGGEST_KEY_PREFIX to namespace cache keys".into(),
            });
        }
        if self.site.site_url.is_empty() {
            return Err(ConfigError::Missing {
                field: "site.site_url".into(),
                hint: "Set OMNISUGGEST_SITE__SITE_URL or [site] site_url in the config file".into(),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.request_delay_ms > 5_000 {
            return Err(ConfigError::Invalid {
                field: "request_delay_ms".into(),
                reason: "must not exceed 5000ms".into(),
            });
        }

        if self.cache_ttl_ms < 1_000 {
            return Err(ConfigError::Invalid { field: "cache_ttl_ms".into(), reason: "must be at least 1000ms".into() });
        }
        if self.cache_ttl_ms > MAX_CACHE_TTL_MS {
            return Err(ConfigError::Invalid {
                field: "cache_ttl_ms".into(),
                reason: format!("must not exceed one year ({MAX_CACHE_TTL_MS}ms)"),
            });
        }

        if self.storage_quota == 0 {
            return Err(ConfigError::Invalid { field: "storage_quota".into(), reason: "must be greater than 0".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if !self.site.api_url.contains("%t") {
            return Err(ConfigError::Invalid {
                field: "site.api_url".into(),
                reason: "must contain the %t category placeholder".into(),
            });
        }

        if self.site.categories.keys().any(|k| k.chars().count() != 1) {
            tracing::warn!(
                categories = self.site.categories.len(),
                "Category keys longer than one letter can never be typed and are ignored"
            );
        }

        Ok(())
    }
}
