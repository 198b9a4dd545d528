//! Watchers sub-resource of a single Jira issue
//!
//! The watchers endpoint is addressed by issue key, while the sync only ever
//! holds the issue's REST handle. The key is resolved on first use and kept
//! for the lifetime of the value.

use super::jira::{GET_TIMEOUT, WRITE_TIMEOUT};
use crate::sync::JiraIssueHandle;
use crate::watchers::{MutationFailure, MutationSuccess, WatcherApi, WatcherMutationResult};
use crate::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::debug;

pub struct JiraWatchers {
    client: Client,
    base_url: String,
    issue_url: JiraIssueHandle,
    auth_token: Option<String>,
    issue_key: OnceCell<String>,
}

#[derive(Debug, Deserialize)]
struct IssueKey {
    key: String,
}

#[derive(Debug, Deserialize)]
struct WatchersResponse {
    #[serde(default)]
    watchers: Vec<Watcher>,
}

#[derive(Debug, Deserialize)]
struct Watcher {
    #[serde(rename = "emailAddress", default)]
    email_address: Option<String>,
}

impl JiraWatchers {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        issue_url: JiraIssueHandle,
        auth_token: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            issue_url,
            auth_token,
            issue_key: OnceCell::new(),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth_token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Issue key, fetched at most once
    pub async fn issue_key(&self) -> Result<&str> {
        let key = self
            .issue_key
            .get_or_try_init(|| self.fetch_issue_key())
            .await?;
        Ok(key.as_str())
    }

    async fn fetch_issue_key(&self) -> Result<String> {
        debug!(url = %self.issue_url, "Resolving JIRA issue key");

        let request = self
            .client
            .get(self.issue_url.as_str())
            .query(&[("fields", "key")]);
        let response = self.authorize(request).timeout(GET_TIMEOUT).send().await?;

        match response.status() {
            StatusCode::OK => {
                let issue: IssueKey = response.json().await?;
                Ok(issue.key)
            }
            status => {
                let error_body = response.text().await.unwrap_or_default();
                Err(crate::SyncError::Integration(format!(
                    "Failed to resolve issue key for {}: HTTP {}: {}",
                    self.issue_url, status, error_body
                )))
            }
        }
    }

    async fn watchers_url(&self) -> Result<String> {
        let key = self.issue_key().await?;
        Ok(format!("{}/rest/api/2/issue/{}/watchers", self.base_url, key))
    }

    async fn settle(&self, email: &str, request: RequestBuilder) -> WatcherMutationResult {
        let response = self
            .authorize(request)
            .timeout(WRITE_TIMEOUT)
            .send()
            .await
            .map_err(|e| MutationFailure {
                email: email.to_string(),
                status: e.status().map(|s| s.as_u16()),
                error: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(MutationSuccess {
                email: email.to_string(),
                status: status.as_u16(),
            })
        } else {
            let error_body = response.text().await.unwrap_or_default();
            Err(MutationFailure {
                email: email.to_string(),
                status: Some(status.as_u16()),
                error: if error_body.is_empty() {
                    status.to_string()
                } else {
                    error_body
                },
            })
        }
    }

    fn unresolved(email: &str, err: crate::SyncError) -> MutationFailure {
        MutationFailure {
            email: email.to_string(),
            status: None,
            error: err.to_string(),
        }
    }
}

#[async_trait]
impl WatcherApi for JiraWatchers {
    async fn list_watchers(&self) -> Result<Vec<String>> {
        let url = self.watchers_url().await?;

        let response = self
            .authorize(self.client.get(&url))
            .timeout(GET_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let result: WatchersResponse = response.json().await?;
                Ok(result
                    .watchers
                    .into_iter()
                    .filter_map(|w| w.email_address)
                    .collect())
            }
            status => {
                let error_body = response.text().await.unwrap_or_default();
                Err(crate::SyncError::Integration(format!(
                    "JIRA API error listing watchers: HTTP {}: {}",
                    status, error_body
                )))
            }
        }
    }

    async fn add_watcher(&self, email: &str) -> WatcherMutationResult {
        let url = self
            .watchers_url()
            .await
            .map_err(|e| Self::unresolved(email, e))?;

        // Jira expects the bare JSON string as the body
        let request = self.client.post(&url).json(email);
        self.settle(email, request).await
    }

    async fn remove_watcher(&self, email: &str) -> WatcherMutationResult {
        let url = self
            .watchers_url()
            .await
            .map_err(|e| Self::unresolved(email, e))?;

        let url = format!("{}?username={}", url, urlencoding::encode(email));
        self.settle(email, self.client.delete(&url)).await
    }
}
