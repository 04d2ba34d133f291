//! Keystroke parsing and per-burst prefix tracking.

pub mod normalize;
pub mod prefix;

pub use normalize::{Normalizer, Query, sanitize_input};
pub use prefix::PrefixChain;
