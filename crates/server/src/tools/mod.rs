//! MCP tool implementations.
//!
//! This module contains all tools exposed by the omnisuggest server.

pub mod cache;
pub mod omnibox;

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

use crate::error::ToolError;

pub use cache::purge_impl;
pub use omnibox::{OmniboxEnterParams, OmniboxInputParams, cancel_impl, enter_impl, input_impl};

/// Serialize a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, ToolError> {
    let json =
        serde_json::to_string_pretty(output).map_err(|e| ToolError::Output(format!("failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
