//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler. It owns the tool registry
//! and answers MCP requests for every transport: the HTTP transport calls the
//! inherent methods directly, the stdio transport goes through the
//! `ServerHandler` implementation.
//!
//! ## Tool Architecture
//!
//! Tools are defined in `domains/tools/definitions/` with one file per tool
//! and registered in `domains/tools/router.rs`.
//! **Adding a new tool does NOT require modifying this file!**

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::config::Config;
use crate::domains::tools::{ToolError, ToolRegistry, build_tool_registry};

/// Instructions sent to clients on initialization.
pub const SERVER_INSTRUCTIONS: &str = "Tools: `add` and `calculate` for arithmetic, \
    `github-prs` to list a user's GitHub pull requests between two ISO-8601 dates.";

/// The main MCP server handler.
///
/// Cheap to clone: configuration and registry are shared.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Registry of all tools, read-only after construction.
    tools: Arc<ToolRegistry>,
}

impl McpServer {
    /// Create a new MCP server with the given configuration and the default tools.
    pub fn new(config: Config) -> super::Result<Self> {
        let tools = build_tool_registry(&config)?;
        Ok(Self::with_registry(config, tools))
    }

    /// Create a server around an already built registry.
    pub fn with_registry(config: Config, tools: ToolRegistry) -> Self {
        Self {
            config: Arc::new(config),
            tools: Arc::new(tools),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the tool registry.
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// List all available tools.
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.list_tools()
    }

    /// Call a tool by name with raw JSON arguments.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult, ToolError> {
        self.tools.invoke(name, arguments).await
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    #[instrument(skip(self, _request, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        info!("Listing tools");
        Ok(ListToolsResult::with_all_items(self.tools.list_tools()))
    }

    #[instrument(skip(self, request, _context), fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = request
            .arguments
            .map(serde_json::Value::Object)
            .unwrap_or(serde_json::Value::Null);

        self.tools
            .invoke(request.name.as_ref(), arguments)
            .await
            .map_err(McpError::from)
    }
}
