//! Tool Router - builds the registry with every tool the server exposes.
//!
//! This is the one place that knows the full tool catalog. The server and
//! all transports receive the resulting registry; none of them list tools
//! themselves.

use tracing::info;

use crate::core::config::Config;

use super::definitions::{AddTool, CalculateTool, GithubClient, GithubError, GithubPrsTool};
use super::registry::ToolRegistry;

/// Build the tool registry with all tools.
pub fn build_tool_registry(config: &Config) -> Result<ToolRegistry, GithubError> {
    let mut registry = ToolRegistry::new();

    AddTool::register(&mut registry);
    CalculateTool::register(&mut registry);
    GithubPrsTool::new(GithubClient::new(&config.github)?).register(&mut registry);

    info!("Registered {} tools: {:?}", registry.len(), registry.tool_names());

    Ok(registry)
}
