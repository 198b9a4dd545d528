//! jira-sync - Mirror GitHub issues into Jira
//!
//! Runs once per GitHub issue event and brings the linked Jira issue in line
//! with it: created or updated while the GitHub issue is open, moved to done
//! once it closes. Jira issues written this way can also have their watcher
//! list kept in line with a configured policy.
//!
//! # Architecture
//!
//! - **sync**: Issue reconciliation and the run entry points
//! - **watchers**: Watcher policy and concurrent watcher reconciliation
//! - **integrations**: HTTP adapters for GitHub and Jira
//! - **config**: YAML file plus CLI/environment overrides, validation
//! - **logging**: tracing setup

pub mod config;
pub mod error;
pub mod integrations;
pub mod logging;
pub mod sync;
pub mod watchers;

// Re-exports
pub use error::{Result, SyncError};
