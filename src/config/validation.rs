//! Configuration validation
//!
//! Validates jira-sync configuration for correctness:
//! - JIRA URL and project are present
//! - URLs are http(s)
//! - Watcher emails look like emails
//! - Watcher concurrency is at least one

use super::sync_config::SyncConfig;
use crate::SyncError;
use std::collections::HashSet;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub section: Option<String>,
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            section: None,
            field: field.into(),
            message: message.into(),
        }
    }

    fn in_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref section) = self.section {
            write!(f, "[{}] {}: {}", section, self.field, self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a jira-sync configuration
pub fn validate_config(config: &SyncConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if config.jira.url.is_empty() {
        errors.push(ValidationError::new("url", "JIRA base URL is required").in_section("jira"));
    } else if !is_http_url(&config.jira.url) {
        errors.push(
            ValidationError::new("url", format!("Invalid JIRA URL: {}", config.jira.url))
                .in_section("jira"),
        );
    }

    if config.jira.project.is_empty() {
        errors.push(
            ValidationError::new("project", "JIRA project key cannot be empty").in_section("jira"),
        );
    }

    if !is_http_url(&config.github.url) {
        errors.push(
            ValidationError::new("url", format!("Invalid GitHub URL: {}", config.github.url))
                .in_section("github"),
        );
    }

    for (field, emails) in [
        ("add", &config.watchers.add),
        ("remove", &config.watchers.remove),
    ] {
        for email in emails {
            if !looks_like_email(email) {
                errors.push(
                    ValidationError::new(field, format!("Not an email address: {}", email))
                        .in_section("watchers"),
                );
            }
        }
    }

    if config.watchers.concurrency == 0 {
        errors.push(
            ValidationError::new("concurrency", "Must be greater than 0").in_section("watchers"),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Non-fatal configuration problems worth surfacing before a run
pub fn config_warnings(config: &SyncConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    let present: HashSet<&str> = config.watchers.add.iter().map(String::as_str).collect();
    for email in &config.watchers.remove {
        if present.contains(email.as_str()) {
            warnings.push(format!(
                "{} is listed in both addWatchers and removeWatchers; it will be kept as a watcher",
                email
            ));
        }
    }

    if config.watchers.add.is_empty() && !config.watchers.remove.is_empty() {
        warnings.push(
            "removeWatchers is set but addWatchers is empty; watcher management is disabled"
                .to_string(),
        );
    }

    warnings
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Validate configuration and return a Result
pub fn validate_config_result(config: &SyncConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        SyncError::Config(format!(
            "Configuration validation failed:\n  - {}",
            messages.join("\n  - ")
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JiraIntegration;

    fn valid_config() -> SyncConfig {
        SyncConfig {
            jira: JiraIntegration::new("https://jira.example.com", "MIG"),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_jira_settings() {
        let result = validate_config(&SyncConfig::default());
        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("JIRA base URL is required"));
        assert!(errors[1].to_string().starts_with("[jira] project"));
    }

    #[test]
    fn test_invalid_urls() {
        let mut config = valid_config();
        config.jira.url = "jira.example.com".to_string();
        config.github.url = "github.com".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_watcher_emails_and_concurrency() {
        let mut config = valid_config();
        config.watchers.add = vec!["ok@example.com".to_string(), "nobody".to_string()];
        config.watchers.remove = vec!["@example.com".to_string()];
        config.watchers.concurrency = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.message.contains("nobody")));
    }

    #[test]
    fn test_overlap_warning() {
        let mut config = valid_config();
        config.watchers.add = vec!["a@example.com".to_string(), "b@example.com".to_string()];
        config.watchers.remove = vec!["b@example.com".to_string(), "c@example.com".to_string()];

        let warnings = config_warnings(&config);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("b@example.com"));
    }

    #[test]
    fn test_remove_without_add_warning() {
        let mut config = valid_config();
        config.watchers.remove = vec!["c@example.com".to_string()];

        let warnings = config_warnings(&config);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("disabled"));
    }

    #[test]
    fn test_validate_config_result_message() {
        let err = validate_config_result(&SyncConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Configuration validation failed"));
    }
}
