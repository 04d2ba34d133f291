//! Suggestion cache over a persistent key/value store.
//!
//! - Aliases from typed prefixes to canonical entries
//! - Half-quota eviction by expiry
//! - In-process expiry alarms
//! - SQLite backend with WAL mode and a versioned schema

pub mod alarms;
pub mod connection;
pub mod entries;
pub mod entry;
pub mod kv;
pub mod schema;
pub mod store;

pub use crate::Error;

pub use alarms::ExpiryAlarms;
pub use connection::CacheDb;
pub use entry::{CacheEntry, ResolvedEntry};
pub use kv::{KvStore, MemoryStore};
pub use store::CacheStore;
