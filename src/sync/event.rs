//! Triggering event input
//!
//! A run targets one GitHub issue, named either directly on the command line
//! or by the webhook payload a workflow writes to `GITHUB_EVENT_PATH`.

use crate::{Result, SyncError};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// The GitHub issue a run reconciles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRef {
    /// `owner/repo`
    pub repo_id: String,
    pub number: u64,
}

impl IssueRef {
    pub fn new(repo_id: impl Into<String>, number: u64) -> Result<Self> {
        let repo_id = repo_id.into();
        match repo_id.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(Self { repo_id, number })
            }
            _ => Err(SyncError::Config(format!(
                "Repository must be in owner/repo form, got: {}",
                repo_id
            ))),
        }
    }

    /// Parse `owner/repo#number`
    pub fn parse(key: &str) -> Result<Self> {
        let (repo_id, number) = key.rsplit_once('#').ok_or_else(|| {
            SyncError::Config(format!("Issue must be in owner/repo#number form, got: {}", key))
        })?;
        let number = number
            .parse()
            .map_err(|_| SyncError::Config(format!("Invalid issue number in: {}", key)))?;
        Self::new(repo_id, number)
    }

    /// Read the issue out of a webhook payload file
    ///
    /// Returns `Ok(None)` when the payload is not about an issue. The
    /// repository comes from the payload, falling back to `repository`
    /// (the `GITHUB_REPOSITORY` value) when the payload lacks one.
    pub fn from_event_file(path: impl AsRef<Path>, repository: Option<&str>) -> Result<Option<Self>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::from_event_json(&content, repository)
    }

    pub fn from_event_json(payload: &str, repository: Option<&str>) -> Result<Option<Self>> {
        let event: EventPayload = serde_json::from_str(payload)?;

        let Some(issue) = event.issue else {
            return Ok(None);
        };

        let repo_id = event
            .repository
            .map(|r| r.full_name)
            .or_else(|| repository.map(str::to_string))
            .ok_or_else(|| {
                SyncError::Config(
                    "Event payload has no repository and GITHUB_REPOSITORY is not set".to_string(),
                )
            })?;

        Self::new(repo_id, issue.number).map(Some)
    }
}

impl fmt::Display for IssueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo_id, self.number)
    }
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    #[serde(default)]
    issue: Option<EventIssue>,
    #[serde(default)]
    repository: Option<EventRepository>,
}

#[derive(Debug, Deserialize)]
struct EventIssue {
    number: u64,
}

#[derive(Debug, Deserialize)]
struct EventRepository {
    full_name: String,
}
