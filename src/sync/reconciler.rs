//! Issue reconciliation
//!
//! Decides what a GitHub issue event means for its linked Jira issue and
//! carries it out. Nothing is persisted between runs: every decision is
//! re-derived from the live state of both systems, which keeps repeated runs
//! idempotent.
//!
//! # Decision
//!
//! - **Closed on GitHub**: find the linked Jira issue. No link ends the run.
//!   Otherwise transition it to done (unless it already is) and ensure the
//!   linking comment.
//! - **Open but untriaged**: a gating label is present, skip.
//! - **Open**: update the linked Jira issue, or create one when there is no
//!   link, then ensure the linking comment.

use super::facade::{GitHubFacade, JiraFacade};
use super::types::{ExternalIssue, JiraIssueHandle, JiraIssueParams};
use crate::{Result, SyncError};
use tracing::{debug, info, warn};

/// Prefix of the comment that links a GitHub issue to its Jira issue
pub const COMMENT_PREFIX: &str = "This issue synced with";

/// Text of the linking comment for a Jira browser URL
pub fn linking_comment(html_url: &str) -> String {
    format!("{}: {}", COMMENT_PREFIX, html_url)
}

/// Label settings that shape a reconciliation
#[derive(Debug, Clone, Default)]
pub struct ReconcileSettings {
    /// Labels whose presence means the issue is not triaged yet
    pub require_missing_labels: Vec<String>,

    /// Labels added to every Jira issue this tool writes
    pub additional_labels: Vec<String>,
}

/// What a reconciliation pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Closed on GitHub and never synced to Jira
    NoLink,

    /// Closed on GitHub; the linked Jira issue is done
    Closed {
        handle: JiraIssueHandle,
        html_url: String,
        /// False when Jira already had the issue in a done status
        transitioned: bool,
    },

    /// Open but carrying gating labels
    Untriaged { labels: Vec<String> },

    /// The linked Jira issue was updated
    Updated {
        handle: JiraIssueHandle,
        html_url: String,
    },

    /// A new Jira issue was created
    Created {
        handle: JiraIssueHandle,
        html_url: String,
    },
}

impl ReconcileOutcome {
    /// The Jira issue that should have watcher policy applied, if any
    pub fn watcher_target(&self) -> Option<&JiraIssueHandle> {
        match self {
            ReconcileOutcome::Updated { handle, .. } | ReconcileOutcome::Created { handle, .. } => {
                Some(handle)
            }
            _ => None,
        }
    }

    /// Short name for logs and the CLI summary
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOutcome::NoLink => "no_link",
            ReconcileOutcome::Closed { .. } => "closed",
            ReconcileOutcome::Untriaged { .. } => "untriaged",
            ReconcileOutcome::Updated { .. } => "updated",
            ReconcileOutcome::Created { .. } => "created",
        }
    }
}

/// Reconciles one GitHub issue against Jira
pub struct IssueReconciler<'a> {
    jira: &'a dyn JiraFacade,
    github: &'a dyn GitHubFacade,
    settings: ReconcileSettings,
}

impl<'a> IssueReconciler<'a> {
    pub fn new(
        jira: &'a dyn JiraFacade,
        github: &'a dyn GitHubFacade,
        settings: ReconcileSettings,
    ) -> Self {
        Self {
            jira,
            github,
            settings,
        }
    }

    /// Run the decision procedure for `issue`
    pub async fn reconcile(&self, issue: &ExternalIssue) -> Result<ReconcileOutcome> {
        if issue.closed {
            return self.reconcile_closed(issue).await;
        }

        let gating: Vec<String> = self
            .settings
            .require_missing_labels
            .iter()
            .filter(|label| issue.has_label(label))
            .cloned()
            .collect();
        if !gating.is_empty() {
            warn!(
                key = %issue.external_key,
                labels = ?gating,
                "This issue has {} that indicate this issue is not triaged.",
                gating.join(",")
            );
            return Ok(ReconcileOutcome::Untriaged { labels: gating });
        }

        let params = JiraIssueParams::from_issue(issue, &self.settings.additional_labels);
        debug!(key = %issue.external_key, labels = ?params.labels, "Built Jira issue params");

        let linked = self
            .jira
            .get_issue_url(&issue.external_key)
            .await
            .map_err(|e| SyncError::lookup(&issue.external_key, e))?;

        match linked {
            Some(handle) => {
                info!(url = %handle, "Jira issue url found, will update");
                self.jira
                    .update_issue(&handle, &params)
                    .await
                    .map_err(|e| SyncError::update(handle.as_str(), e))?;

                let html_url = self.link_back(issue, &handle).await?;
                Ok(ReconcileOutcome::Updated { handle, html_url })
            }
            None => {
                info!(key = %issue.external_key, "No linked Jira issue, creating one");
                let handle = self
                    .jira
                    .create_issue(&params)
                    .await
                    .map_err(|e| SyncError::create(&issue.external_key, e))?;
                info!(url = %handle, "Created Jira issue");

                let html_url = self.link_back(issue, &handle).await?;
                Ok(ReconcileOutcome::Created { handle, html_url })
            }
        }
    }

    async fn reconcile_closed(&self, issue: &ExternalIssue) -> Result<ReconcileOutcome> {
        let handle = match self
            .jira
            .get_issue_url(&issue.external_key)
            .await
            .map_err(|e| SyncError::lookup(&issue.external_key, e))?
        {
            Some(handle) => handle,
            None => {
                info!(
                    key = %issue.external_key,
                    "No corresponding Jira found for this closed issue"
                );
                return Ok(ReconcileOutcome::NoLink);
            }
        };
        info!(url = %handle, "Jira issue url found");

        let done = self
            .jira
            .issue_is_done(&handle)
            .await
            .map_err(|e| SyncError::transition(handle.as_str(), e))?;

        if !done {
            self.jira
                .transition_done(&handle)
                .await
                .map_err(|e| SyncError::transition(handle.as_str(), e))?;
            info!(url = %handle, "Transitioned Jira issue to done");
        } else {
            debug!(url = %handle, "Jira issue already done");
        }

        let html_url = self.link_back(issue, &handle).await?;
        Ok(ReconcileOutcome::Closed {
            handle,
            html_url,
            transitioned: !done,
        })
    }

    /// Resolve the browser URL and make sure the GitHub issue points at it
    async fn link_back(&self, issue: &ExternalIssue, handle: &JiraIssueHandle) -> Result<String> {
        let html_url = self
            .jira
            .html_url(handle)
            .await
            .map_err(|e| SyncError::comment(&issue.external_key, e))?;

        self.github
            .ensure_comment(issue, &linking_comment(&html_url))
            .await
            .map_err(|e| SyncError::comment(&issue.external_key, e))?;

        Ok(html_url)
    }
}
