//! GitHub pull request search tool.
//!
//! Lists the pull requests a user opened within a date range using the
//! GitHub issue search API. Every failure (missing token, upstream error,
//! network error) is reported as text in a normal result.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::client::{GithubClient, GithubError, SearchIssueItem};
use crate::domains::tools::envelope::{text_result, text_results};
use crate::domains::tools::registry::{ToolParams, ToolRegistry};

/// Text returned when no token is configured.
pub const MISSING_TOKEN_MESSAGE: &str = "Error: GitHub PAT not found in environment variables";

/// Parameters for the github-prs tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GithubPrsParams {
    /// Start of the creation date range.
    #[schemars(description = "ISO-8601 UTC datetime, e.g. 2024-01-01T00:00:00Z")]
    pub start_date: String,

    /// End of the creation date range.
    #[schemars(description = "ISO-8601 UTC datetime, e.g. 2024-02-01T00:00:00Z")]
    pub end_date: String,

    /// GitHub login of the pull request author.
    pub github_username: String,
}

impl GithubPrsParams {
    /// Build the issue search query for these parameters.
    pub fn search_query(&self) -> String {
        format!(
            "author:{} type:pr created:{}..{}",
            self.github_username, self.start_date, self.end_date
        )
    }
}

impl ToolParams for GithubPrsParams {
    fn validate(&self) -> Result<(), String> {
        parse_utc_datetime("startDate", &self.start_date)?;
        parse_utc_datetime("endDate", &self.end_date)?;
        if self.github_username.trim().is_empty() {
            return Err("githubUsername must not be empty".to_string());
        }
        Ok(())
    }
}

/// Parse an ISO-8601 datetime in UTC (`Z` designator required).
///
/// RFC 3339 also allows a space or a lowercase `t` between date and time;
/// both are rejected, a space would split the search qualifier.
fn parse_utc_datetime(field: &str, value: &str) -> Result<DateTime<FixedOffset>, String> {
    if !value.ends_with('Z') || value.as_bytes().get(10) != Some(&b'T') {
        return Err(format!(
            "{} must be an ISO-8601 UTC datetime like 2024-01-01T00:00:00Z, got '{}'",
            field, value
        ));
    }
    DateTime::parse_from_rfc3339(value)
        .map_err(|e| format!("{} is not a valid ISO-8601 datetime ('{}'): {}", field, value, e))
}

/// A pull request as returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestRecord {
    pub title: String,
    pub url: String,
    pub created_at: String,
    pub state: String,
}

impl From<SearchIssueItem> for PullRequestRecord {
    fn from(item: SearchIssueItem) -> Self {
        Self {
            title: item.title,
            url: item.html_url,
            created_at: item.created_at,
            state: item.state,
        }
    }
}

/// GitHub PRs tool - searches pull requests by author and creation date.
#[derive(Debug, Clone)]
pub struct GithubPrsTool {
    client: Arc<GithubClient>,
}

impl GithubPrsTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "github-prs";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "List the GitHub pull requests opened by a user between two dates. Returns a summary line followed by a JSON array of {title, url, createdAt, state}.";

    /// Create the tool around a GitHub client.
    pub fn new(client: GithubClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Execute the tool logic.
    #[instrument(skip_all, fields(user = %params.github_username))]
    pub async fn execute(&self, params: &GithubPrsParams) -> CallToolResult {
        let query = params.search_query();
        info!("Searching pull requests: {}", query);

        let response = match self.client.search_issues(&query).await {
            Ok(response) => response,
            Err(GithubError::MissingToken) => {
                warn!("github-prs called without a configured token");
                return text_result(MISSING_TOKEN_MESSAGE);
            }
            Err(e) => {
                warn!("Pull request search failed: {}", e);
                return text_result(format!("Error fetching PRs: {}", e));
            }
        };

        if response.incomplete_results {
            warn!("GitHub reported incomplete search results");
        }

        let prs: Vec<PullRequestRecord> = response.items.into_iter().map(Into::into).collect();

        let listing = match serde_json::to_string_pretty(&prs) {
            Ok(json) => json,
            Err(e) => return text_result(format!("Error fetching PRs: {}", e)),
        };

        info!("Found {} pull requests", prs.len());

        text_results([
            format!(
                "Found {} PRs for {} between {} and {}:",
                prs.len(),
                params.github_username,
                params.start_date,
                params.end_date
            ),
            listing,
        ])
    }

    /// Register this tool in the given registry.
    pub fn register(self, registry: &mut ToolRegistry) {
        let tool = Arc::new(self);
        registry.register(Self::NAME, Self::DESCRIPTION, move |params: GithubPrsParams| {
            let tool = tool.clone();
            async move { Ok(tool.execute(&params).await) }
        });
    }
}

// ============================================================================
// Tests
// ============================================================================
