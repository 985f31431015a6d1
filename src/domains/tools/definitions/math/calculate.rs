//! Calculator tool definition.
//!
//! Supports the four basic operations. Division by zero is answered with a
//! plain text message instead of an error so the caller can react to it.

use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domains::tools::envelope::{format_number, text_result};
use crate::domains::tools::registry::{ToolParams, ToolRegistry};

/// Text returned when dividing by zero.
pub const DIVIDE_BY_ZERO_MESSAGE: &str = "Error: Cannot divide by zero";

/// Arithmetic operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    /// Apply the operation. Returns `None` when dividing by zero.
    pub fn apply(self, a: f64, b: f64) -> Option<f64> {
        match self {
            Self::Add => Some(a + b),
            Self::Subtract => Some(a - b),
            Self::Multiply => Some(a * b),
            // -0.0 == 0.0, so negative zero is rejected too
            Self::Divide if b == 0.0 => None,
            Self::Divide => Some(a / b),
        }
    }
}

/// Parameters for the calculate tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CalculateParams {
    /// Operation to perform.
    #[schemars(description = "One of: add, subtract, multiply, divide")]
    pub operation: Operation,

    /// Left operand.
    pub a: f64,

    /// Right operand.
    pub b: f64,
}

impl ToolParams for CalculateParams {}

/// Calculate tool - basic arithmetic on two numbers.
pub struct CalculateTool;

impl CalculateTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "calculate";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Perform a basic arithmetic operation (add, subtract, multiply, divide) on two numbers.";

    /// Execute the tool logic.
    pub fn execute(params: &CalculateParams) -> CallToolResult {
        match params.operation.apply(params.a, params.b) {
            Some(value) => {
                debug!(
                    "{:?}({}, {}) = {}",
                    params.operation, params.a, params.b, value
                );
                text_result(format_number(value))
            }
            None => {
                info!("Rejected division of {} by zero", params.a);
                text_result(DIVIDE_BY_ZERO_MESSAGE)
            }
        }
    }

    /// Register this tool in the given registry.
    pub fn register(registry: &mut ToolRegistry) {
        registry.register(
            Self::NAME,
            Self::DESCRIPTION,
            |params: CalculateParams| async move { Ok(Self::execute(&params)) },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::ToolError;
    use crate::domains::tools::envelope::result_texts;

    fn calculate(operation: Operation, a: f64, b: f64) -> String {
        let result = CalculateTool::execute(&CalculateParams { operation, a, b });
        assert_eq!(result.is_error, Some(false));
        result_texts(&result)[0].to_string()
    }

    #[test]
    fn test_operations() {
        assert_eq!(calculate(Operation::Add, 6.0, 3.0), "9");
        assert_eq!(calculate(Operation::Subtract, 6.0, 3.0), "3");
        assert_eq!(calculate(Operation::Multiply, 6.0, 3.0), "18");
        assert_eq!(calculate(Operation::Divide, 6.0, 3.0), "2");
        assert_eq!(calculate(Operation::Divide, 1.0, 4.0), "0.25");
        assert_eq!(calculate(Operation::Subtract, 3.0, 6.5), "-3.5");
    }

    #[test]
    fn test_divide_by_zero_is_handled() {
        assert_eq!(calculate(Operation::Divide, 5.0, 0.0), DIVIDE_BY_ZERO_MESSAGE);
        assert_eq!(calculate(Operation::Divide, 0.0, 0.0), DIVIDE_BY_ZERO_MESSAGE);
        assert_eq!(calculate(Operation::Divide, -1.0, -0.0), DIVIDE_BY_ZERO_MESSAGE);
    }

    #[test]
    fn test_operation_wire_names() {
        let op: Operation = serde_json::from_str("\"multiply\"").unwrap();
        assert_eq!(op, Operation::Multiply);
        assert!(serde_json::from_str::<Operation>("\"modulo\"").is_err());
    }

    #[tokio::test]
    async fn test_calculate_through_registry() {
        let mut registry = ToolRegistry::new();
        CalculateTool::register(&mut registry);

        let result = registry
            .invoke(
                "calculate",
                serde_json::json!({ "operation": "divide", "a": 10, "b": 0 }),
            )
            .await
            .unwrap();
        assert_eq!(result_texts(&result), vec![DIVIDE_BY_ZERO_MESSAGE]);
        assert_eq!(result.is_error, Some(false));

        let err = registry
            .invoke(
                "calculate",
                serde_json::json!({ "operation": "power", "a": 2, "b": 8 }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn test_schema_lists_operations() {
        let mut registry = ToolRegistry::new();
        CalculateTool::register(&mut registry);
        let tool = registry.get_tool("calculate").unwrap();
        let schema = serde_json::Value::Object((*tool.input_schema).clone()).to_string();
        for op in ["add", "subtract", "multiply", "divide"] {
            assert!(schema.contains(op), "schema should mention {}", op);
        }
    }
}
