//! GitHub to Jira issue sync
//!
//! One run handles one GitHub issue:
//!
//! 1. Fetch the issue from GitHub and snapshot it as an [`ExternalIssue`]
//! 2. Reconcile it against Jira ([`IssueReconciler`])
//! 3. When an open issue was created or updated in Jira, converge that
//!    issue's watchers toward the configured policy
//!
//! The linkage between the two systems lives only in Jira labels and a
//! GitHub comment, so runs can be repeated freely.

mod event;
mod facade;
mod reconciler;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use event::IssueRef;
pub use facade::{GitHubFacade, JiraFacade};
pub use reconciler::{
    linking_comment, IssueReconciler, ReconcileOutcome, ReconcileSettings, COMMENT_PREFIX,
};
pub use types::{slugify, ExternalIssue, JiraIssueHandle, JiraIssueParams};

use crate::config::SyncConfig;
use crate::integrations::{GitHubAdapter, JiraAdapter};
use crate::watchers::{WatcherOutcome, WatcherPolicy, WatcherReconciler};
use crate::{Result, SyncError};
use tracing::info;

/// Everything one run did
#[derive(Debug)]
pub struct RunSummary {
    pub outcome: ReconcileOutcome,
    /// `None` when the outcome had no Jira issue to apply watchers to
    pub watchers: Option<WatcherOutcome>,
}

impl ReconcileSettings {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            require_missing_labels: config.require_missing_labels.clone(),
            additional_labels: config.additional_labels.clone(),
        }
    }
}

/// Sync one GitHub issue into Jira
pub async fn run(
    github: &GitHubAdapter,
    jira: &JiraAdapter,
    config: &SyncConfig,
    issue: &IssueRef,
) -> Result<RunSummary> {
    let external = github
        .fetch_external_issue(issue)
        .await
        .map_err(|e| SyncError::fetch_issue(issue.to_string(), e))?;

    info!(
        key = %external.external_key,
        closed = external.closed,
        "Reconciling GitHub issue"
    );

    let reconciler = IssueReconciler::new(jira, github, ReconcileSettings::from_config(config));
    let outcome = reconciler.reconcile(&external).await?;

    let watchers = match outcome.watcher_target() {
        Some(handle) => Some(run_watchers(jira, handle, config).await?),
        None => None,
    };

    Ok(RunSummary { outcome, watchers })
}

/// Apply the configured watcher policy to one Jira issue
pub async fn run_watchers(
    jira: &JiraAdapter,
    handle: &JiraIssueHandle,
    config: &SyncConfig,
) -> Result<WatcherOutcome> {
    let api = jira.watchers(handle);
    WatcherReconciler::new(&api, WatcherPolicy::from_config(&config.watchers))
        .with_concurrency(config.watchers.concurrency)
        .reconcile()
        .await
        .map_err(|e| SyncError::lookup(handle.to_string(), e))
}
