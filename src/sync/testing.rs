//! In-memory facades for reconciler tests

use super::facade::{GitHubFacade, JiraFacade};
use super::types::{ExternalIssue, JiraIssueHandle, JiraIssueParams};
use crate::{Result, SyncError};
use async_trait::async_trait;
use std::sync::Mutex;

pub const LINKED: &str = "https://jira.example.com/rest/api/2/issue/10001";
pub const CREATED: &str = "https://jira.example.com/rest/api/2/issue/10002";

pub fn open_issue() -> ExternalIssue {
    ExternalIssue {
        number: 42,
        closed: false,
        title: "Transfer PVC hangs".to_string(),
        body: "crane transfer-pvc never completes".to_string(),
        labels: vec!["kind/bug".to_string()],
        external_key: "konveyor/crane#42".to_string(),
        repo_id: "konveyor/crane".to_string(),
        url: "https://github.com/konveyor/crane/issues/42".to_string(),
        is_bug: true,
    }
}

pub fn closed_issue() -> ExternalIssue {
    ExternalIssue {
        closed: true,
        ..open_issue()
    }
}

/// Records every call; `fail` names the one operation that should error
#[derive(Default)]
pub struct FakeJira {
    pub link: Option<JiraIssueHandle>,
    pub done: bool,
    pub fail: Option<&'static str>,
    pub calls: Mutex<Vec<String>>,
    pub written: Mutex<Vec<JiraIssueParams>>,
}

impl FakeJira {
    pub fn linked() -> Self {
        Self {
            link: Some(JiraIssueHandle::new(LINKED)),
            ..Default::default()
        }
    }

    pub fn failing(mut self, op: &'static str) -> Self {
        self.fail = Some(op);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(op.to_string());
        if self.fail == Some(op) {
            return Err(SyncError::Integration(format!("{} exploded", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl JiraFacade for FakeJira {
    async fn get_issue_url(&self, _external_key: &str) -> Result<Option<JiraIssueHandle>> {
        self.record("get")?;
        Ok(self.link.clone())
    }

    async fn issue_is_done(&self, _handle: &JiraIssueHandle) -> Result<bool> {
        self.record("is_done")?;
        Ok(self.done)
    }

    async fn transition_done(&self, _handle: &JiraIssueHandle) -> Result<()> {
        self.record("transition")
    }

    async fn update_issue(
        &self,
        _handle: &JiraIssueHandle,
        params: &JiraIssueParams,
    ) -> Result<()> {
        self.record("update")?;
        self.written.lock().unwrap().push(params.clone());
        Ok(())
    }

    async fn create_issue(&self, params: &JiraIssueParams) -> Result<JiraIssueHandle> {
        self.record("create")?;
        self.written.lock().unwrap().push(params.clone());
        Ok(JiraIssueHandle::new(CREATED))
    }

    async fn html_url(&self, handle: &JiraIssueHandle) -> Result<String> {
        self.record("html_url")?;
        let id = handle.as_str().rsplit('/').next().unwrap_or_default();
        Ok(format!("https://jira.example.com/browse/MIG-{}", id))
    }
}

#[derive(Default)]
pub struct FakeGitHub {
    pub comments: Mutex<Vec<String>>,
    pub ensure_calls: Mutex<u32>,
}

impl FakeGitHub {
    pub fn comments(&self) -> Vec<String> {
        self.comments.lock().unwrap().clone()
    }
}

#[async_trait]
impl GitHubFacade for FakeGitHub {
    async fn ensure_comment(&self, _issue: &ExternalIssue, text: &str) -> Result<()> {
        *self.ensure_calls.lock().unwrap() += 1;
        let prefix = text.split(": ").next().unwrap_or(text);
        let mut comments = self.comments.lock().unwrap();
        if !comments.iter().any(|c| c.starts_with(prefix)) {
            comments.push(text.to_string());
        }
        Ok(())
    }
}
