//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{self, OmniboxEnterParams, OmniboxInputParams};

use omnisuggest_client::{HttpTransport, SearchSession};
use omnisuggest_core::CacheDb;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// Search session over the production transport and SQLite cache.
pub type Session = SearchSession<HttpTransport, CacheDb>;

/// The main MCP server handler for omnisuggest.
#[derive(Clone)]
pub struct OmnisuggestServer {
    session: Arc<Session>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl OmnisuggestServer {
    /// Create a new server handler around one omnibox session.
    pub fn new(session: Arc<Session>) -> Self {
        Self { session, tool_router: Self::tool_router() }
    }

    /// Report an edit of the omnibox text.
    ///
    /// Debounced: a newer call supersedes this one, which then returns no suggestions.
    #[tool(
        description = "Report the current omnibox text. Returns ranked suggestions with description markup, a summary row and the best match."
    )]
    async fn omnibox_input(&self, params: Parameters<OmniboxInputParams>) -> Result<CallToolResult, McpError> {
        tools::input_impl(&*self.session, params.0).await
    }

    #[tool(description = "Commit the omnibox text. Returns the URL to open.")]
    async fn omnibox_enter(&self, params: Parameters<OmniboxEnterParams>) -> Result<CallToolResult, McpError> {
        tools::enter_impl(&*self.session, params.0).await
    }

    #[tool(description = "The omnibox was dismissed. Aborts any pending debounce or request.")]
    async fn omnibox_cancel(&self) -> Result<CallToolResult, McpError> {
        tools::cancel_impl(&*self.session).await
    }

    #[tool(description = "Remove expired cached suggestions and aliases whose target is gone. Returns the number deleted.")]
    async fn cache_purge(&self) -> Result<CallToolResult, McpError> {
        tools::purge_impl(self.session.cache()).await
    }
}

impl ServerHandler for OmnisuggestServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "omnisuggest".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Call omnibox_input on every edit of the search box and omnibox_enter when it is committed.".into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
