//! GitHub tools module.
//!
//! - `client`: thin REST client for the issue search endpoint
//! - `prs`: the `github-prs` tool built on top of it

pub mod client;
pub mod prs;

pub use client::{GithubClient, GithubError};
pub use prs::{GithubPrsParams, GithubPrsTool, MISSING_TOKEN_MESSAGE, PullRequestRecord};
