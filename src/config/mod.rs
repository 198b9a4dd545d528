//! Configuration system
//!
//! Loads an optional YAML file and layers CLI/environment values on top:
//! - JIRA and GitHub connection settings
//! - Triage gating labels and additional Jira labels
//! - Watcher policy

mod integrations;
mod sync_config;
pub mod validation;

pub use integrations::{token_from_env, GitHubIntegration, JiraIntegration};
pub use sync_config::{parse_list, ConfigOverrides, SyncConfig, WatcherConfig};
pub use validation::{config_warnings, validate_config, validate_config_result, ValidationError};
