//! GitHub PRs MCP Server Library
//!
//! A remote Model Context Protocol (MCP) server exposing three tools:
//!
//! - `add`: sum of two numbers
//! - `calculate`: add, subtract, multiply or divide two numbers
//! - `github-prs`: pull requests a GitHub user opened between two dates
//!
//! # Architecture
//!
//! - **core**: configuration, errors, the server handler and the transports
//!   (`/mcp` and `/sse` over HTTP, optionally stdio)
//! - **domains**: business logic organized by bounded contexts
//!   - **tools**: the tool registry and tool definitions
//!
//! # Example
//!
//! ```rust,no_run
//! use github_prs_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config.clone())?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
