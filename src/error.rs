//! Error types for jira-sync
//!
//! Covers every way a reconciliation pass can fail. Phase variants wrap the
//! underlying cause so the run-level message names what was being attempted
//! and against which issue. Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Result type alias for jira-sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Comprehensive error type for jira-sync operations
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Integration errors (JIRA, GitHub)
    #[error("Integration error: {0}")]
    Integration(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Fetching the triggering GitHub issue failed
    #[error("Failed to get GitHub Issue {issue}: {source}")]
    FetchIssue {
        issue: String,
        #[source]
        source: Box<SyncError>,
    },

    /// Searching Jira for the linked issue failed
    #[error("Failed to get Jira issue for key {key}: {source}")]
    Lookup {
        key: String,
        #[source]
        source: Box<SyncError>,
    },

    /// Moving the linked Jira issue to done failed
    #[error("Something went wrong closing issue {url}: {source}")]
    Transition {
        url: String,
        #[source]
        source: Box<SyncError>,
    },

    /// Updating the linked Jira issue failed
    #[error("Failed to update Jira Issue with url {url}: {source}")]
    Update {
        url: String,
        #[source]
        source: Box<SyncError>,
    },

    /// Creating a new Jira issue failed
    #[error("Failed to create Jira Issue for {key}: {source}")]
    Create {
        key: String,
        #[source]
        source: Box<SyncError>,
    },

    /// Posting the linking comment on GitHub failed
    #[error("Failed to comment on GitHub Issue {key}: {source}")]
    Comment {
        key: String,
        #[source]
        source: Box<SyncError>,
    },
}

impl SyncError {
    pub fn fetch_issue(issue: impl Into<String>, source: SyncError) -> Self {
        Self::FetchIssue {
            issue: issue.into(),
            source: Box::new(source),
        }
    }

    pub fn lookup(key: impl Into<String>, source: SyncError) -> Self {
        Self::Lookup {
            key: key.into(),
            source: Box::new(source),
        }
    }

    pub fn transition(url: impl Into<String>, source: SyncError) -> Self {
        Self::Transition {
            url: url.into(),
            source: Box::new(source),
        }
    }

    pub fn update(url: impl Into<String>, source: SyncError) -> Self {
        Self::Update {
            url: url.into(),
            source: Box::new(source),
        }
    }

    pub fn create(key: impl Into<String>, source: SyncError) -> Self {
        Self::Create {
            key: key.into(),
            source: Box::new(source),
        }
    }

    pub fn comment(key: impl Into<String>, source: SyncError) -> Self {
        Self::Comment {
            key: key.into(),
            source: Box::new(source),
        }
    }

    /// Name of the reconciliation phase that failed, if any
    pub fn phase(&self) -> Option<&'static str> {
        match self {
            SyncError::FetchIssue { .. } | SyncError::Lookup { .. } => Some("get"),
            SyncError::Transition { .. } => Some("transition"),
            SyncError::Update { .. } => Some("update"),
            SyncError::Create { .. } => Some("create"),
            SyncError::Comment { .. } => Some("comment"),
            _ => None,
        }
    }
}
