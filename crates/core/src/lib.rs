//! Core types and shared functionality for omnisuggest.
//!
//! This crate provides:
//! - Query normalization and the typed-prefix chain
//! - Result ranking, highlighting and description markup
//! - Suggestion cache over a key/value store, with a SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod query;
pub mod rank;

pub use cache::{CacheDb, CacheEntry, CacheStore, KvStore, MemoryStore, ResolvedEntry};
pub use config::{AppConfig, SiteProfile};
pub use error::Error;
pub use query::{Normalizer, PrefixChain, Query};
