//! External Integrations
//!
//! HTTP adapters for the two systems a sync touches.
//!
//! - **GitHub**: REST v3 client that reads the source issue and posts the
//!   linking comment
//! - **JIRA**: REST v2 client that finds, creates, updates and closes the
//!   linked issue, plus its watchers sub-resource

pub mod github;
pub mod jira;
pub mod jira_watchers;

// GitHub exports
pub use github::{GitHubAdapter, GitHubComment, GitHubIssue, GitHubLabel};

// JIRA exports
pub use jira::{
    JiraAdapter, JiraFields, JiraIssue, JiraIssueRef, JiraStatus, JiraStatusCategory,
    JiraTransition,
};
pub use jira_watchers::JiraWatchers;
