//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - Typed registration of tools (name, input shape, handler)
//! - Lookup-and-invoke with argument validation
//! - A capture layer that turns handler failures into error text results
//! - Tool metadata for listing
//!
//! The registry is built once at startup (see [`build_tool_registry`]) and
//! shared read-only behind an `Arc`; nothing in it is mutated per call.
//!
//! [`build_tool_registry`]: super::router::build_tool_registry

use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use rmcp::{
    handler::server::tool::cached_schema_for_type,
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use tracing::{error, info, instrument, warn};

use super::envelope::error_result;
use super::error::ToolError;

// ============================================================================
// Input shapes
// ============================================================================

/// A typed tool input.
///
/// Deserialization checks the structural shape (field names and JSON types),
/// `validate` checks the constraints serde cannot express, such as date
/// formats. Both run before the handler is called.
pub trait ToolParams: DeserializeOwned + JsonSchema + Send + 'static {
    /// Check value-level constraints on already-deserialized input.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Deserialize and validate raw JSON arguments into `P`.
///
/// A missing (`null`) argument object is treated as an empty object; any
/// other non-object value is rejected, as serde would read an array
/// positionally into the struct fields.
pub fn parse_params<P: ToolParams>(arguments: serde_json::Value) -> Result<P, ToolError> {
    let arguments = match arguments {
        serde_json::Value::Null => serde_json::Value::Object(Default::default()),
        object @ serde_json::Value::Object(_) => object,
        _ => return Err(ToolError::invalid_arguments("arguments must be an object")),
    };

    let params: P = serde_json::from_value(arguments)
        .map_err(|e| ToolError::invalid_arguments(e.to_string()))?;
    params.validate().map_err(ToolError::invalid_arguments)?;

    Ok(params)
}

// ============================================================================
// Tool Registry
// ============================================================================

type ToolFuture = BoxFuture<'static, Result<CallToolResult, ToolError>>;

/// Type-erased handler: validates raw arguments and, on success, returns the
/// future running the typed handler.
type DynToolHandler = Arc<dyn Fn(serde_json::Value) -> Result<ToolFuture, ToolError> + Send + Sync>;

/// A registered tool: its metadata (name, description, input schema) and handler.
#[derive(Clone)]
struct RegisteredTool {
    tool: Tool,
    handler: DynToolHandler,
}

/// Tool registry - manages all available tools.
///
/// Registering a name that is already present replaces the earlier
/// definition (last registration wins); the overwrite is logged.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, RegisteredTool>,
}

impl ToolRegistry {
    /// Create an empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool whose input shape is `P`.
    pub fn register<P, F, Fut>(&mut self, name: &'static str, description: &'static str, handler: F)
    where
        P: ToolParams,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<CallToolResult, ToolError>> + Send + 'static,
    {
        let tool = Tool {
            name: name.into(),
            description: Some(description.into()),
            input_schema: cached_schema_for_type::<P>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        };

        let handler = Arc::new(handler);
        let dyn_handler: DynToolHandler = Arc::new(
            move |arguments: serde_json::Value| -> Result<ToolFuture, ToolError> {
                let params = parse_params::<P>(arguments)?;
                let handler = handler.clone();
                // The handler is called inside the future so that a panic while
                // building it is caught by the same capture layer.
                Ok(async move { handler(params).await }.boxed())
            },
        );

        let previous = self.tools.insert(
            name.to_string(),
            RegisteredTool {
                tool,
                handler: dyn_handler,
            },
        );

        if previous.is_some() {
            warn!("Tool '{}' registered twice; keeping the latest definition", name);
        }
    }

    /// Invoke a tool by name with raw (untyped) arguments.
    ///
    /// Fails with [`ToolError::NotFound`] or [`ToolError::InvalidArguments`]
    /// without running the handler. Once the handler runs, the call always
    /// yields a `CallToolResult`: handler errors and panics are converted into
    /// an error text result.
    #[instrument(skip(self, arguments))]
    pub async fn invoke(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult, ToolError> {
        let registered = self.tools.get(name).ok_or_else(|| {
            warn!("Unknown tool requested: {}", name);
            ToolError::not_found(name)
        })?;

        let future = (registered.handler)(arguments).inspect_err(|e| {
            warn!("Rejected arguments for tool '{}': {}", name, e);
        })?;

        info!("Executing tool '{}'", name);

        Ok(capture(name, future).await)
    }

    /// Get all tools as Tool models (metadata), sorted by name.
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.values().map(|t| t.tool.clone()).collect()
    }

    /// Get the metadata of a single tool.
    pub fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tools.get(name).map(|t| t.tool.clone())
    }

    /// Get all tool names, sorted.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Whether a tool with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry has no tools.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Run a handler future, converting any failure into an error text result.
async fn capture(name: &str, future: ToolFuture) -> CallToolResult {
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            warn!("Tool '{}' failed: {}", name, e);
            error_result(e)
        }
        Err(panic) => {
            let message = panic_message(&*panic);
            error!("Tool '{}' panicked: {}", name, message);
            error_result(format!("Tool '{}' failed unexpectedly: {}", name, message))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
