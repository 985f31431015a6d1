//! Minimal GitHub REST client for the issue search endpoint.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::core::config::GithubConfig;

/// Media type requested from the GitHub API.
pub const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// User agent sent with every request (GitHub rejects requests without one).
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Errors raised while talking to GitHub.
#[derive(Debug, Error)]
pub enum GithubError {
    /// No personal access token is configured.
    #[error("GitHub PAT not found in environment variables")]
    MissingToken,

    /// GitHub answered with a non-2xx status; `body` is the raw response body.
    #[error("{body}")]
    Status { status: StatusCode, body: String },

    /// The request could not be sent or the response could not be read.
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    /// The search query could not be encoded.
    #[error("Invalid search query: {0}")]
    Query(#[from] serde_urlencoded::ser::Error),
}

/// Response of `GET /search/issues`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchIssuesResponse {
    pub items: Vec<SearchIssueItem>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
}

/// One issue or pull request from a search response.
///
/// Only the fields the tools consume are decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchIssueItem {
    pub title: String,
    pub html_url: String,
    pub created_at: String,
    pub state: String,
}

/// GitHub API client.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GithubClient {
    /// Build a client from configuration.
    pub fn new(config: &GithubConfig) -> Result<Self, GithubError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token().map(str::to_string),
        })
    }

    /// Build the URL of a search request for `query`.
    pub fn search_url(&self, query: &str) -> Result<String, GithubError> {
        let pairs: &[(&str, &str)] = &[("q", query)];
        let encoded = serde_urlencoded::to_string(pairs)?;
        Ok(format!("{}/search/issues?{}", self.api_url, encoded))
    }

    /// Run a single issue search. No retries, no pagination.
    ///
    /// Fails with [`GithubError::MissingToken`] before touching the network
    /// when no token is configured.
    #[instrument(skip(self))]
    pub async fn search_issues(&self, query: &str) -> Result<SearchIssuesResponse, GithubError> {
        let token = self.token.as_deref().ok_or(GithubError::MissingToken)?;
        let url = self.search_url(query)?;

        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .header(ACCEPT, GITHUB_ACCEPT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            warn!("GitHub search failed with status {}", status);
            return Err(GithubError::Status { status, body });
        }

        Ok(response.json::<SearchIssuesResponse>().await?)
    }
}
