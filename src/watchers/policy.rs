//! Desired watcher state and the diff against live state

use crate::config::WatcherConfig;
use std::collections::HashSet;

/// Emails that should and should not watch a synced Jira issue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatcherPolicy {
    pub ensure_present: Vec<String>,
    pub ensure_absent: Vec<String>,
}

impl WatcherPolicy {
    pub fn new(ensure_present: Vec<String>, ensure_absent: Vec<String>) -> Self {
        Self {
            ensure_present,
            ensure_absent,
        }
    }

    pub fn from_config(config: &WatcherConfig) -> Self {
        Self::new(config.add.clone(), config.remove.clone())
    }

    /// An empty present set means watcher management is off, not "remove everyone"
    pub fn is_enabled(&self) -> bool {
        !self.ensure_present.is_empty()
    }
}

/// Watchers to add and remove, computed from one snapshot of the live list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatcherPlan {
    pub to_add: Vec<String>,
    pub to_delete: Vec<String>,
}

impl WatcherPlan {
    /// Diff `policy` against the `current` watcher emails
    ///
    /// Input order is kept and repeated emails collapse. An email in both
    /// policy sets is only ever added: presence wins.
    pub fn compute(policy: &WatcherPolicy, current: &[String]) -> Self {
        let current: HashSet<&str> = current.iter().map(String::as_str).collect();
        let present: HashSet<&str> = policy.ensure_present.iter().map(String::as_str).collect();

        let mut seen = HashSet::new();
        let to_add = policy
            .ensure_present
            .iter()
            .map(String::as_str)
            .filter(|email| !current.contains(email))
            .filter(|email| seen.insert(*email))
            .map(str::to_string)
            .collect();

        let mut seen = HashSet::new();
        let to_delete = policy
            .ensure_absent
            .iter()
            .map(String::as_str)
            .filter(|email| current.contains(email) && !present.contains(email))
            .filter(|email| seen.insert(*email))
            .map(str::to_string)
            .collect();

        Self { to_add, to_delete }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_delete.is_empty()
    }
}
