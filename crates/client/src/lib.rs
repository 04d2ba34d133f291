//! Client code for omnisuggest.
//!
//! This crate provides the prefix-search transport, the debounced fetch
//! orchestrator and the per-omnibox search session used by the server.

pub mod api;
pub mod image;
pub mod orchestrator;
pub mod session;

#[cfg(test)]
mod testing;

pub use api::{ApiError, HttpTransport, Payload, Transport};
pub use orchestrator::FetchOrchestrator;
pub use session::{InputOutcome, SearchSession};
