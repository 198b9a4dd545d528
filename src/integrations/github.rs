//! GitHub Issues Integration Adapter
//!
//! Fetches the triggering issue and maintains the linking comment using the
//! REST API.

use crate::config::{token_from_env, GitHubIntegration};
use crate::sync::{ExternalIssue, GitHubFacade, IssueRef};
use crate::Result;
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Per-request timeout for single issue fetches
const GET_TIMEOUT: Duration = Duration::from_secs(10);
/// Per-request timeout for create operations
const WRITE_TIMEOUT: Duration = Duration::from_secs(15);
/// Page size when listing comments
const COMMENTS_PER_PAGE: usize = 100;

/// Label names that mark an issue as a bug
const BUG_LABELS: [&str; 2] = ["bug", "kind/bug"];

/// GitHub REST API client
pub struct GitHubAdapter {
    client: Client,
    rest_base_url: String,
    auth_token: Option<String>,
}

/// GitHub issue (REST API format)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubIssue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: String,
    #[serde(default)]
    pub labels: Vec<GitHubLabel>,
    pub html_url: String,
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubLabel {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubComment {
    pub id: u64,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
struct CreateCommentRequest {
    body: String,
}

impl GitHubIssue {
    /// Snapshot this issue for reconciliation
    pub fn to_external_issue(&self, repo_id: &str) -> ExternalIssue {
        let labels: Vec<String> = self.labels.iter().map(|l| l.name.clone()).collect();
        let is_bug = labels
            .iter()
            .any(|l| BUG_LABELS.iter().any(|b| l.eq_ignore_ascii_case(b)));

        ExternalIssue {
            number: self.number,
            closed: self.state.eq_ignore_ascii_case("closed"),
            title: self.title.clone(),
            body: self.body.clone().unwrap_or_default(),
            labels,
            external_key: ExternalIssue::key_for(repo_id, self.number),
            repo_id: repo_id.to_string(),
            url: self.html_url.clone(),
            is_bug,
        }
    }
}

impl GitHubAdapter {
    /// Create a new GitHub adapter
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &GitHubIntegration) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::USER_AGENT,
                    header::HeaderValue::from_static("jira-sync/0.1"),
                );
                headers.insert(
                    header::ACCEPT,
                    header::HeaderValue::from_static("application/vnd.github.v3+json"),
                );
                headers
            })
            .build()?; // reqwest::Error converts to SyncError::Http via #[from]

        let base_url = config.url.trim_end_matches('/');
        let rest_base_url = if base_url == "https://github.com" || base_url == "http://github.com"
        {
            "https://api.github.com".to_string()
        } else if base_url.contains("api.github.com") || base_url.ends_with("/api/v3") {
            base_url.to_string()
        } else {
            format!("{}/api/v3", base_url)
        };

        let auth_token = token_from_env(config.token_env.as_deref());

        Ok(Self {
            client,
            rest_base_url,
            auth_token,
        })
    }

    /// Point the adapter at an explicit REST root (GHES proxies, test servers)
    pub fn with_rest_base_url(mut self, url: impl Into<String>) -> Self {
        self.rest_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }

    fn issue_url(&self, repo_id: &str, number: u64) -> String {
        format!("{}/repos/{}/issues/{}", self.rest_base_url, repo_id, number)
    }

    /// Get a single issue by number
    pub async fn get_issue(&self, issue: &IssueRef) -> Result<GitHubIssue> {
        let url = self.issue_url(&issue.repo_id, issue.number);

        debug!(issue = %issue, "Fetching GitHub issue");

        let mut request = self.client.get(&url);
        if let Some(ref token) = self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.timeout(GET_TIMEOUT).send().await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(crate::SyncError::Integration(format!(
                "Issue not found: {}",
                issue
            ))),
            StatusCode::UNAUTHORIZED => Err(crate::SyncError::Integration(
                "GitHub authentication failed".to_string(),
            )),
            status => {
                let error_body = response.text().await.unwrap_or_default();
                Err(crate::SyncError::Integration(format!(
                    "GitHub API error: HTTP {}: {}",
                    status, error_body
                )))
            }
        }
    }

    /// Fetch an issue and snapshot it for reconciliation
    pub async fn fetch_external_issue(&self, issue: &IssueRef) -> Result<ExternalIssue> {
        let fetched = self.get_issue(issue).await?;
        if fetched.pull_request.is_some() {
            debug!(issue = %issue, "Pull request, syncing it like an issue");
        }
        Ok(fetched.to_external_issue(&issue.repo_id))
    }

    /// List every comment on an issue, following pagination
    pub async fn list_comments(&self, repo_id: &str, number: u64) -> Result<Vec<GitHubComment>> {
        let url = format!("{}/comments", self.issue_url(repo_id, number));
        let mut comments = Vec::new();
        let mut page = 1u32;

        loop {
            let mut request = self.client.get(&url).query(&[
                ("per_page", COMMENTS_PER_PAGE.to_string()),
                ("page", page.to_string()),
            ]);
            if let Some(ref token) = self.auth_token {
                request = request.bearer_auth(token);
            }

            let response = request.timeout(GET_TIMEOUT).send().await?;

            let batch: Vec<GitHubComment> = match response.status() {
                StatusCode::OK => response.json().await?,
                status => {
                    let error_body = response.text().await.unwrap_or_default();
                    return Err(crate::SyncError::Integration(format!(
                        "GitHub list comments failed: HTTP {}: {}",
                        status, error_body
                    )));
                }
            };

            let last_page = batch.len() < COMMENTS_PER_PAGE;
            comments.extend(batch);
            if last_page {
                break;
            }
            page += 1;
        }

        debug!(repo = %repo_id, number = %number, count = comments.len(), "Listed GitHub comments");
        Ok(comments)
    }

    /// Add a comment to an issue
    pub async fn add_comment(&self, repo_id: &str, number: u64, body: &str) -> Result<GitHubComment> {
        let url = format!("{}/comments", self.issue_url(repo_id, number));

        info!(repo = %repo_id, number = %number, "Adding comment to GitHub issue");

        let request_body = CreateCommentRequest {
            body: body.to_string(),
        };

        let mut http_request = self.client.post(&url).json(&request_body);
        if let Some(ref token) = self.auth_token {
            http_request = http_request.bearer_auth(token);
        }

        let response = http_request.timeout(WRITE_TIMEOUT).send().await?;

        match response.status() {
            StatusCode::CREATED => Ok(response.json().await?),
            status => {
                let error_body = response.text().await.unwrap_or_default();
                Err(crate::SyncError::Integration(format!(
                    "GitHub comment failed: HTTP {}: {}",
                    status, error_body
                )))
            }
        }
    }
}

#[async_trait]
impl GitHubFacade for GitHubAdapter {
    async fn ensure_comment(&self, issue: &ExternalIssue, text: &str) -> Result<()> {
        let prefix = text.split(": ").next().unwrap_or(text);

        let comments = self.list_comments(&issue.repo_id, issue.number).await?;
        if comments.iter().any(|c| c.body.starts_with(prefix)) {
            debug!(key = %issue.external_key, "Linking comment already present");
            return Ok(());
        }

        self.add_comment(&issue.repo_id, issue.number, text).await?;
        Ok(())
    }
}
