//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (OMNISUGGEST_*)
//! 2. TOML config file (if OMNISUGGEST_CONFIG_FILE set)
//! 3. Built-in defaults

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (OMNISUGGEST_*)
/// 2. TOML config file (if OMNISUGGEST_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via OMNISUGGEST_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via OMNISUGGEST_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via OMNISUGGEST_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Namespace prefix for every cache key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Lifetime of a fetched result in milliseconds.
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    /// Quiet period before a keystroke turns into a request.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Storage quota in bytes; eviction starts past half of it.
    #[serde(default = "default_storage_quota")]
    pub storage_quota: u64,

    /// The site being searched.
    #[serde(default)]
    pub site: SiteProfile,
}

/// URLs and category table of the searched site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteProfile {
    /// Site root, opened when the input is empty.
    pub site_url: String,
    /// Prefix-search endpoint; `%t` is replaced by the category name and the
    /// encoded text is appended.
    pub api_url: String,
    /// Full search page for one category; `%c` is replaced by the category.
    pub search_url: String,
    /// Full search page across all categories.
    pub search_all_url: String,
    /// Category used when the input carries no `/x` suffix.
    pub default_category: String,
    /// One-letter category keys typed after `/`.
    pub categories: BTreeMap<String, String>,
    /// Extra headers sent with every API request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

const SITE_URL: &str = "https://myanimelist.net/";

impl Default for SiteProfile {
    fn default() -> Self {
        let categories = [
            ("a", "anime"),
            ("m", "manga"),
            ("c", "character"),
            ("p", "person"),
            ("u", "user"),
            ("n", "news"),
            ("f", "forum"),
            ("k", "club"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            site_url: SITE_URL.into(),
            api_url: format!("{SITE_URL}search/prefix.json?type=%t&v=1&keyword="),
            search_url: format!("{SITE_URL}%c.php?q="),
            search_all_url: format!("{SITE_URL}search/all?q="),
            default_category: "all".into(),
            categories,
            headers: BTreeMap::from([("X-LControl".to_string(), "x-no-cache".to_string())]),
        }
    }
}

impl SiteProfile {
    /// Category name for a one-letter key, case-insensitive.
    pub fn category_for(&self, key: &str) -> Option<&str> {
        self.categories.get(&key.to_lowercase()).map(String::as_str)
    }

    /// Category letters usable in a character class.
    pub fn category_letters(&self) -> String {
        self.categories.keys().filter(|k| k.chars().count() == 1).cloned().collect()
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./omnisuggest-cache.sqlite")
}

fn default_user_agent() -> String {
    "omnisuggest/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_key_prefix() -> String {
    "input:".into()
}

fn default_cache_ttl_ms() -> u64 {
    7 * 24 * 3600 * 1000 // 7 days
}

fn default_request_delay_ms() -> u64 {
    200
}

fn default_storage_quota() -> u64 {
    5_242_880 // 5MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            key_prefix: default_key_prefix(),
            cache_ttl_ms: default_cache_ttl_ms(),
            request_delay_ms: default_request_delay_ms(),
            storage_quota: default_storage_quota(),
            site: SiteProfile::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Debounce delay as Duration.
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Cache lifetime as a chrono duration, for computing expiry timestamps.
    pub fn cache_ttl(&self) -> chrono::Duration {
        let ttl = self.cache_ttl_ms.min(validation::MAX_CACHE_TTL_MS);
        chrono::Duration::milliseconds(i64::try_from(ttl).unwrap_or(i64::MAX))
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `OMNISUGGEST_`
    /// 2. TOML file from `OMNISUGGEST_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("OMNISUGGEST_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("OMNISUGGEST_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./omnisuggest-cache.sqlite"));
        assert_eq!(config.user_agent, "omnisuggest/0.1");
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.key_prefix, "input:");
        assert_eq!(config.cache_ttl_ms, 604_800_000);
        assert_eq!(config.request_delay_ms, 200);
        assert_eq!(config.storage_quota, 5_242_880);
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
        assert_eq!(config.request_delay(), Duration::from_millis(200));
        assert_eq!(config.cache_ttl(), chrono::Duration::days(7));
    }

    #[test]
    fn test_site_profile_categories() {
        let site = SiteProfile::default();
        assert_eq!(site.category_for("a"), Some("anime"));
        assert_eq!(site.category_for("K"), Some("club"));
        assert_eq!(site.category_for("z"), None);
        assert_eq!(site.category_letters(), "acfkmnpu");
        assert!(site.api_url.contains("%t"));
    }

    #[test]
    fn test_load_from_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "omnisuggest.toml",
                r#"
                request_delay_ms = 350
                [site]
                site_url = "https://example.org/"
                api_url = "https://example.org/api?type=%t&q="
                search_url = "https://example.org/%c?q="
                search_all_url = "https://example.org/all?q="
                default_category = "all"
                categories = { b = "book" }
                "#,
            )?;
            jail.set_env("OMNISUGGEST_CONFIG_FILE", "omnisuggest.toml");
            jail.set_env("OMNISUGGEST_KEY_PREFIX", "q:");

            let config = AppConfig::load().expect("config should load");
            assert_eq!(config.request_delay_ms, 350);
            assert_eq!(config.key_prefix, "q:");
            assert_eq!(config.site.category_for("b"), Some("book"));
            assert_eq!(config.site.site_url, "https://example.org/");
            Ok(())
        });
    }
}
