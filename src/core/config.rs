//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables, a `.env` file, or defaults.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};

/// Default base URL of the GitHub REST API.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Default timeout for outbound GitHub requests, in seconds.
pub const DEFAULT_GITHUB_TIMEOUT_SECS: u64 = 30;

/// Main configuration structure for the MCP server.
///
/// This struct contains all configurable aspects of the server, organized
/// by domain for clarity and maintainability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// GitHub API access configuration.
    pub github: GithubConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Configuration for the GitHub search adapter.
#[derive(Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Personal access token used as bearer credential.
    /// A missing token is reported by the `github-prs` tool, not at startup.
    pub token: Option<String>,

    /// Base URL of the REST API, without trailing slash.
    pub api_url: String,

    /// Timeout applied to each outbound request, in seconds.
    pub timeout_secs: u64,
}

impl GithubConfig {
    /// Load the GitHub section from environment variables.
    pub fn from_env() -> Self {
        let mut github = Self::default();

        github.token = ["MCP_GITHUB_PAT", "GITHUB_PAT"]
            .into_iter()
            .filter_map(|key| std::env::var(key).ok())
            .find(|t| !t.trim().is_empty());

        if let Ok(api_url) = std::env::var("MCP_GITHUB_API_URL") {
            github.api_url = api_url.trim_end_matches('/').to_string();
        }

        if let Ok(timeout) = std::env::var("MCP_GITHUB_TIMEOUT_SECS") {
            github.timeout_secs = timeout.parse().unwrap_or(DEFAULT_GITHUB_TIMEOUT_SECS);
        }

        github
    }

    /// The configured token, treating an empty string as absent.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            timeout_secs: DEFAULT_GITHUB_TIMEOUT_SECS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "github-prs-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: TransportConfig::default(),
            github: GithubConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_LOG_LEVEL`. The GitHub token is
    /// also accepted under its conventional `GITHUB_PAT` name.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        config.github = GithubConfig::from_env();

        config
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    pub(crate) static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    fn clear_github_env() {
        unsafe {
            std::env::remove_var("MCP_GITHUB_PAT");
            std::env::remove_var("GITHUB_PAT");
            std::env::remove_var("MCP_GITHUB_API_URL");
            std::env::remove_var("MCP_GITHUB_TIMEOUT_SECS");
        }
    }

    #[test]
    fn test_github_token_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_github_env();
        unsafe {
            std::env::set_var("MCP_GITHUB_PAT", "ghp_test_12345");
        }
        let github = GithubConfig::from_env();
        assert_eq!(github.token(), Some("ghp_test_12345"));
        clear_github_env();
    }

    #[test]
    fn test_github_token_fallback_name() {
        let _lock = ENV_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_github_env();
        unsafe {
            std::env::set_var("GITHUB_PAT", "ghp_fallback");
        }
        let github = GithubConfig::from_env();
        assert_eq!(github.token(), Some("ghp_fallback"));
        clear_github_env();
    }

    #[test]
    fn test_github_token_absent_is_not_fatal() {
        let _lock = ENV_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_github_env();
        unsafe {
            std::env::set_var("MCP_GITHUB_PAT", "   ");
        }
        let github = GithubConfig::from_env();
        assert_eq!(github.token(), None);
        assert_eq!(github.api_url, DEFAULT_GITHUB_API_URL);
        clear_github_env();
    }

    #[test]
    fn test_empty_primary_token_falls_back() {
        let _lock = ENV_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_github_env();
        unsafe {
            std::env::set_var("MCP_GITHUB_PAT", "");
            std::env::set_var("GITHUB_PAT", "ghp_real");
        }
        let github = GithubConfig::from_env();
        assert_eq!(github.token(), Some("ghp_real"));
        clear_github_env();
    }

    #[test]
    fn test_github_api_url_and_timeout_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_github_env();
        unsafe {
            std::env::set_var("MCP_GITHUB_API_URL", "http://127.0.0.1:9999/");
            std::env::set_var("MCP_GITHUB_TIMEOUT_SECS", "not-a-number");
        }
        let github = GithubConfig::from_env();
        assert_eq!(github.api_url, "http://127.0.0.1:9999");
        assert_eq!(github.timeout_secs, DEFAULT_GITHUB_TIMEOUT_SECS);
        clear_github_env();
    }

    #[test]
    fn test_empty_token_treated_as_absent() {
        let github = GithubConfig {
            token: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(github.token(), None);
    }

    #[test]
    fn test_credentials_redacted_in_debug() {
        let github = GithubConfig {
            token: Some("super_secret_token".to_string()),
            ..Default::default()
        };
        let debug_str = format!("{:?}", github);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super_secret_token"));
    }

    #[test]
    fn test_config_default_has_no_token() {
        let config = Config::default();
        assert!(config.github.token().is_none());
        assert_eq!(config.github.timeout_secs, DEFAULT_GITHUB_TIMEOUT_SECS);
    }
}
