//! Addition tool definition.

use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::debug;

use crate::domains::tools::envelope::{format_number, text_result};
use crate::domains::tools::registry::{ToolParams, ToolRegistry};

/// Parameters for the add tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddParams {
    /// First operand.
    pub a: f64,

    /// Second operand.
    pub b: f64,
}

impl ToolParams for AddParams {}

/// Add tool - returns the sum of two numbers.
pub struct AddTool;

impl AddTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "add";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Add two numbers and return the sum.";

    /// Execute the tool logic.
    pub fn execute(params: &AddParams) -> CallToolResult {
        let sum = params.a + params.b;
        debug!("{} + {} = {}", params.a, params.b, sum);
        text_result(format_number(sum))
    }

    /// Register this tool in the given registry.
    pub fn register(registry: &mut ToolRegistry) {
        registry.register(Self::NAME, Self::DESCRIPTION, |params: AddParams| async move {
            Ok(Self::execute(&params))
        });
    }
}
