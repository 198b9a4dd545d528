//! jira-sync configuration file handling
//!
//! A run is configured from an optional YAML file plus CLI flags and
//! environment variables. Flags win over the file.

use super::integrations::{GitHubIntegration, JiraIntegration};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_watcher_concurrency() -> usize {
    8
}

/// Split a comma-separated option into trimmed, non-empty entries
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Watcher policy settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Emails that should watch every synced issue. Empty disables watcher management.
    #[serde(default)]
    pub add: Vec<String>,

    /// Emails that should not watch synced issues
    #[serde(default)]
    pub remove: Vec<String>,

    /// Maximum watcher requests in flight at once
    #[serde(default = "default_watcher_concurrency")]
    pub concurrency: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            add: Vec::new(),
            remove: Vec::new(),
            concurrency: default_watcher_concurrency(),
        }
    }
}

/// jira-sync configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// JIRA connection
    #[serde(default)]
    pub jira: JiraIntegration,

    /// GitHub connection
    #[serde(default)]
    pub github: GitHubIntegration,

    /// Labels whose presence marks an issue as not yet triaged
    #[serde(default)]
    pub require_missing_labels: Vec<String>,

    /// Extra labels applied to every Jira issue this tool writes
    #[serde(default)]
    pub additional_labels: Vec<String>,

    /// Watcher policy
    #[serde(default)]
    pub watchers: WatcherConfig,
}

/// Values supplied on the command line or through the environment
///
/// List values are raw comma-separated strings, exactly as a workflow input
/// would provide them.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub jira_base_url: Option<String>,
    pub jira_project: Option<String>,
    pub github_url: Option<String>,
    pub require_missing_labels: Option<String>,
    pub additional_labels: Option<String>,
    pub add_watchers: Option<String>,
    pub remove_watchers: Option<String>,
    pub watcher_concurrency: Option<usize>,
}

impl SyncConfig {
    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::SyncError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading jira-sync configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            jira = %config.jira.url,
            project = %config.jira.project,
            add_watchers = config.watchers.add.len(),
            remove_watchers = config.watchers.remove.len(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Apply CLI/environment values on top of this configuration
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.jira_base_url {
            self.jira.url = url;
        }
        if let Some(project) = overrides.jira_project {
            self.jira.project = project;
        }
        if let Some(url) = overrides.github_url {
            self.github.url = url;
        }
        if let Some(raw) = overrides.require_missing_labels {
            self.require_missing_labels = parse_list(&raw);
        }
        if let Some(raw) = overrides.additional_labels {
            self.additional_labels = parse_list(&raw);
        }
        if let Some(raw) = overrides.add_watchers {
            tracing::debug!(raw = %raw, "Raw addWatchers");
            self.watchers.add = parse_list(&raw);
        }
        if let Some(raw) = overrides.remove_watchers {
            tracing::debug!(raw = %raw, "Raw removeWatchers");
            self.watchers.remove = parse_list(&raw);
        }
        if let Some(concurrency) = overrides.watcher_concurrency {
            self.watchers.concurrency = concurrency;
        }
    }
}
