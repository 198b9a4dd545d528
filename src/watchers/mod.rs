//! Jira watcher management
//!
//! Keeps a configured set of people watching every synced Jira issue, and a
//! second set off it.

mod policy;
mod reconciler;

pub use policy::{WatcherPlan, WatcherPolicy};
pub use reconciler::{
    BatchResult, MutationFailure, MutationSuccess, WatcherApi, WatcherMutationResult,
    WatcherOutcome, WatcherReconciler, WatcherReport,
};
