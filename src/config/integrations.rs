//! Integration endpoints
//!
//! Connection settings for the JIRA instance and the GitHub API.

use serde::{Deserialize, Serialize};

fn default_jira_token_env() -> Option<String> {
    Some("JIRA_TOKEN".to_string())
}

fn default_github_url() -> String {
    "https://github.com".to_string()
}

fn default_github_token_env() -> Option<String> {
    Some("GITHUB_TOKEN".to_string())
}

/// JIRA integration configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraIntegration {
    /// JIRA instance URL
    #[serde(default)]
    pub url: String,

    /// JIRA project key new issues are created in
    #[serde(default)]
    pub project: String,

    /// Environment variable holding the bearer token
    #[serde(
        default = "default_jira_token_env",
        skip_serializing_if = "Option::is_none"
    )]
    pub token_env: Option<String>,
}

impl JiraIntegration {
    pub fn new(url: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            project: project.into(),
            token_env: default_jira_token_env(),
        }
    }

    /// Base URL with any trailing slash removed
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

impl Default for JiraIntegration {
    fn default() -> Self {
        Self::new("", "")
    }
}

/// GitHub integration configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubIntegration {
    /// GitHub instance URL (e.g., "https://github.com" or "https://github.ibm.com")
    #[serde(default = "default_github_url")]
    pub url: String,

    /// Environment variable holding the bearer token
    #[serde(
        default = "default_github_token_env",
        skip_serializing_if = "Option::is_none"
    )]
    pub token_env: Option<String>,
}

impl Default for GitHubIntegration {
    fn default() -> Self {
        Self {
            url: default_github_url(),
            token_env: default_github_token_env(),
        }
    }
}

/// Read a token from the environment variable named by `token_env`
///
/// A leading `$` on the variable name is ignored so `$JIRA_TOKEN` and
/// `JIRA_TOKEN` are equivalent.
pub fn token_from_env(token_env: Option<&str>) -> Option<String> {
    token_env
        .and_then(|name| std::env::var(name.trim_start_matches('$')).ok())
        .filter(|token| !token.is_empty())
}
