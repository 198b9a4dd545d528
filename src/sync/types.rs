//! Issue snapshot, Jira write intent, and Jira handle types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Read-only snapshot of a GitHub issue, fetched once per run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIssue {
    /// Issue number within its repository
    pub number: u64,

    pub closed: bool,
    pub title: String,
    pub body: String,

    /// GitHub label names, in the order GitHub returned them
    pub labels: Vec<String>,

    /// Stable cross-system key, e.g. `konveyor/crane#1234`
    pub external_key: String,

    /// Repository identifier, e.g. `konveyor/crane`
    pub repo_id: String,

    /// Human-viewable issue URL
    pub url: String,

    pub is_bug: bool,
}

impl ExternalIssue {
    /// Build the external key for an issue number in a repository
    pub fn key_for(repo_id: &str, number: u64) -> String {
        format!("{}#{}", repo_id, number)
    }

    /// Check for a label by name (GitHub label names are case-insensitive)
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.eq_ignore_ascii_case(name))
    }

    /// Labels rewritten into a form Jira accepts (no spaces)
    pub fn labels_slugified(&self) -> Vec<String> {
        self.labels
            .iter()
            .map(|l| slugify(l))
            .filter(|l| !l.is_empty())
            .collect()
    }
}

/// Lowercase a label and collapse every run of non-alphanumerics into one `-`
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut pending_dash = false;

    for c in label.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// The fields this tool owns on a Jira issue
///
/// Labels applied, in order:
/// - the configured additional labels
/// - the repo id (ie. konveyor/crane) for filtering
/// - the external key (ie. konveyor/crane#1234) that links the issue
/// - the GitHub labels, slugified
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JiraIssueParams {
    pub is_bug: bool,
    pub summary: String,
    pub description: String,
    pub labels: Vec<String>,
    pub url: String,
    pub external_key: String,
}

impl JiraIssueParams {
    pub fn from_issue(issue: &ExternalIssue, additional_labels: &[String]) -> Self {
        let mut labels = additional_labels.to_vec();
        labels.push(issue.repo_id.clone());
        labels.push(issue.external_key.clone());
        labels.extend(issue.labels_slugified());

        Self {
            is_bug: issue.is_bug,
            summary: issue.title.clone(),
            description: issue.body.clone(),
            labels,
            url: issue.url.clone(),
            external_key: issue.external_key.clone(),
        }
    }
}

/// Opaque locator for a Jira issue: its REST `self` URL
///
/// Used directly as the path for follow-up API calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JiraIssueHandle(String);

impl JiraIssueHandle {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JiraIssueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_issue() -> ExternalIssue {
        ExternalIssue {
            number: 1234,
            closed: false,
            title: "Stage fails on PVC with no storage class".to_string(),
            body: "Steps to reproduce...".to_string(),
            labels: vec!["kind/bug".to_string(), "good first issue".to_string()],
            external_key: ExternalIssue::key_for("konveyor/crane", 1234),
            repo_id: "konveyor/crane".to_string(),
            url: "https://github.com/konveyor/crane/issues/1234".to_string(),
            is_bug: true,
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("kind/bug"), "kind-bug");
        assert_eq!(slugify("Good First Issue"), "good-first-issue");
        assert_eq!(slugify("  priority: P1 "), "priority-p1");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_has_label_ignores_case() {
        let issue = sample_issue();
        assert!(issue.has_label("Kind/Bug"));
        assert!(!issue.has_label("needs-triage"));
    }

    #[test]
    fn test_params_labels_carry_linkage() {
        let issue = sample_issue();
        let additional = vec!["crane".to_string(), "konveyor/crane".to_string()];
        let params = JiraIssueParams::from_issue(&issue, &additional);

        assert_eq!(
            params.labels,
            vec![
                "crane",
                "konveyor/crane",
                "konveyor/crane",
                "konveyor/crane#1234",
                "kind-bug",
                "good-first-issue",
            ]
        );
        assert_eq!(params.summary, issue.title);
        assert!(params.is_bug);
    }

    #[test]
    fn test_params_labels_without_additional() {
        let mut issue = sample_issue();
        issue.labels.clear();
        let params = JiraIssueParams::from_issue(&issue, &[]);

        assert!(params.labels.contains(&issue.repo_id));
        assert!(params.labels.contains(&issue.external_key));
        assert_eq!(params.labels.len(), 2);
    }
}
