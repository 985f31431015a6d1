//! Tools domain module.
//!
//! This module handles all tool-related functionality for the MCP server.
//! Tools are executable functions that can be called by MCP clients to perform
//! specific actions or computations.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `registry.rs` - Typed registration, validation and invocation
//! - `router.rs` - Builds the registry with every exposed tool
//! - `envelope.rs` - Helpers shaping `CallToolResult` text content
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/` with a params struct implementing
//!    `ToolParams` and a `register()` function
//! 2. Export it in `definitions/mod.rs`
//! 3. Call its `register()` from `build_tool_registry` in `router.rs`

pub mod definitions;
pub mod envelope;
mod error;
pub mod registry;
pub mod router;

pub use error::ToolError;
pub use registry::{ToolParams, ToolRegistry};
pub use router::build_tool_registry;
