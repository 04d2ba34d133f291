//! Cache-related MCP tools.

pub mod purge;

pub use purge::purge_impl;
