//! Transport layer for the MCP server.
//!
//! This module provides different transport implementations:
//! - **HTTP**: `POST /mcp` (single request/response) and `GET /sse` with
//!   `POST /sse/message` (streaming) - feature: `http` (default)
//! - **STDIO**: Standard input/output for local clients - feature: `stdio`
//!
//! Each transport handles the connection lifecycle and delegates
//! message processing to the MCP server handler.

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(feature = "http")]
pub use config::HttpConfig;
