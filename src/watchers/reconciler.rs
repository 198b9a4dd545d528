//! Watcher reconciliation
//!
//! Converges the live watcher list of one Jira issue toward a
//! [`WatcherPolicy`]. The add batch settles completely before the delete
//! batch starts. Inside a batch, requests run concurrently up to a limit and
//! every one of them settles: a failed email never stops its siblings and
//! never fails the run.

use super::policy::{WatcherPlan, WatcherPolicy};
use crate::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::fmt;
use tracing::{debug, error, info, warn};

/// A watcher change that went through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationSuccess {
    pub email: String,
    pub status: u16,
}

/// A watcher change that did not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationFailure {
    pub email: String,
    /// HTTP status, when a response was received at all
    pub status: Option<u16>,
    pub error: String,
}

impl fmt::Display for MutationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (HTTP {}): {}", self.email, status, self.error),
            None => write!(f, "{}: {}", self.email, self.error),
        }
    }
}

/// Outcome of a single add or remove call
pub type WatcherMutationResult = std::result::Result<MutationSuccess, MutationFailure>;

/// The watchers sub-resource of one Jira issue
#[async_trait]
pub trait WatcherApi: Send + Sync {
    /// Email addresses currently watching the issue
    async fn list_watchers(&self) -> Result<Vec<String>>;

    async fn add_watcher(&self, email: &str) -> WatcherMutationResult;

    async fn remove_watcher(&self, email: &str) -> WatcherMutationResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatcherOp {
    Add,
    Remove,
}

/// Settled results of one batch, in the same order as `requested`
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub requested: Vec<String>,
    pub results: Vec<WatcherMutationResult>,
}

impl BatchResult {
    pub fn failures(&self) -> impl Iterator<Item = &MutationFailure> {
        self.results.iter().filter_map(|r| r.as_ref().err())
    }

    pub fn successes(&self) -> impl Iterator<Item = &MutationSuccess> {
        self.results.iter().filter_map(|r| r.as_ref().ok())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }
}

/// What a watcher pass did
#[derive(Debug, Clone)]
pub enum WatcherOutcome {
    /// No watchers to ensure, nothing was fetched or changed
    Disabled,

    Reconciled(WatcherReport),
}

#[derive(Debug, Clone, Default)]
pub struct WatcherReport {
    pub plan: WatcherPlan,
    pub additions: BatchResult,
    pub removals: BatchResult,
}

impl WatcherReport {
    pub fn failure_count(&self) -> usize {
        self.additions.failure_count() + self.removals.failure_count()
    }
}

/// Applies a watcher policy to one Jira issue
pub struct WatcherReconciler<'a> {
    api: &'a dyn WatcherApi,
    policy: WatcherPolicy,
    concurrency: usize,
}

impl<'a> WatcherReconciler<'a> {
    pub fn new(api: &'a dyn WatcherApi, policy: WatcherPolicy) -> Self {
        Self {
            api,
            policy,
            concurrency: 8,
        }
    }

    /// Cap on requests in flight within one batch
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetch the live watchers, diff, and apply the difference
    ///
    /// Only reading the current watcher list can fail this call. Individual
    /// add/remove failures are logged and returned in the report.
    pub async fn reconcile(&self) -> Result<WatcherOutcome> {
        if !self.policy.is_enabled() {
            info!("No desired watchers have been configured and none will be added");
            return Ok(WatcherOutcome::Disabled);
        }

        debug!(
            ensure_present = ?self.policy.ensure_present,
            ensure_absent = ?self.policy.ensure_absent,
            "Ensuring desired watchers"
        );

        let current = self.api.list_watchers().await?;
        debug!(current = ?current, "Current watcher list");

        let plan = WatcherPlan::compute(&self.policy, &current);
        info!(watchers = ?plan.to_add, "Adding missing watchers");
        info!(watchers = ?plan.to_delete, "Removing watchers that should not be present");

        let additions = self.run_batch(WatcherOp::Add, &plan.to_add).await;
        let removals = self.run_batch(WatcherOp::Remove, &plan.to_delete).await;

        Ok(WatcherOutcome::Reconciled(WatcherReport {
            plan,
            additions,
            removals,
        }))
    }

    async fn run_batch(&self, op: WatcherOp, emails: &[String]) -> BatchResult {
        let results: Vec<WatcherMutationResult> = stream::iter(emails)
            .map(|email| self.mutate(op, email))
            .buffered(self.concurrency)
            .collect()
            .await;

        let batch = BatchResult {
            requested: emails.to_vec(),
            results,
        };

        debug!(op = ?op, results = ?batch.results, "Watcher batch settled");

        let failures = batch.failure_count();
        if failures != 0 {
            warn!(
                "Failed to change {} watcher(s), operating on list: {:?}",
                failures, batch.requested
            );
            for failure in batch.failures() {
                error!(
                    email = %failure.email,
                    status = ?failure.status,
                    op = ?op,
                    "{}",
                    failure.error
                );
            }
        }

        batch
    }

    async fn mutate(&self, op: WatcherOp, email: &str) -> WatcherMutationResult {
        match op {
            WatcherOp::Add => self.api.add_watcher(email).await,
            WatcherOp::Remove => self.api.remove_watcher(email).await,
        }
    }
}
