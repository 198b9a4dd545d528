//! Facade traits the reconciler drives
//!
//! The HTTP adapters in [`crate::integrations`] implement these; tests use
//! in-memory fakes.

use super::types::{ExternalIssue, JiraIssueHandle, JiraIssueParams};
use crate::Result;
use async_trait::async_trait;

/// The GitHub side of a sync
#[async_trait]
pub trait GitHubFacade: Send + Sync {
    /// Post `text` on the issue unless a comment with the same prefix
    /// (everything before the first `": "`) already exists
    async fn ensure_comment(&self, issue: &ExternalIssue, text: &str) -> Result<()>;
}

/// The Jira side of a sync
#[async_trait]
pub trait JiraFacade: Send + Sync {
    /// Find the Jira issue labelled with `external_key`
    async fn get_issue_url(&self, external_key: &str) -> Result<Option<JiraIssueHandle>>;

    /// Whether the issue's status is in the done category
    async fn issue_is_done(&self, handle: &JiraIssueHandle) -> Result<bool>;

    /// Move the issue to a done status
    async fn transition_done(&self, handle: &JiraIssueHandle) -> Result<()>;

    async fn update_issue(&self, handle: &JiraIssueHandle, params: &JiraIssueParams)
        -> Result<()>;

    async fn create_issue(&self, params: &JiraIssueParams) -> Result<JiraIssueHandle>;

    /// Browser URL for the issue
    async fn html_url(&self, handle: &JiraIssueHandle) -> Result<String>;
}
