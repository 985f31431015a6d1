//! Tool definitions module.
//!
//! This module exports all available tool definitions.
//! Each tool is defined in its own file for better maintainability.

pub mod github;
pub mod math;

pub use github::{GithubClient, GithubError, GithubPrsParams, GithubPrsTool};
pub use math::{AddParams, AddTool, CalculateParams, CalculateTool, Operation};
