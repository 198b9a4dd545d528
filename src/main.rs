//! jira-sync - keep Jira in step with GitHub issues
//!
//! Main entry point for the jira-sync CLI.

use clap::{Args, Parser, Subcommand};
use jira_sync::config::{config_warnings, validate_config_result, ConfigOverrides, SyncConfig};
use jira_sync::integrations::{GitHubAdapter, JiraAdapter};
use jira_sync::sync::{self, IssueRef, JiraIssueHandle, RunSummary};
use jira_sync::watchers::WatcherOutcome;
use std::path::PathBuf;
use std::process;

/// jira-sync - Mirror GitHub issues into Jira and manage their watchers
#[derive(Parser, Debug)]
#[command(name = "jira-sync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, env = "JIRA_SYNC_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: OverrideArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct OverrideArgs {
    /// Jira base URL
    #[arg(long, env = "JIRA_BASE_URL", global = true)]
    jira_base_url: Option<String>,

    /// Jira project key for created issues
    #[arg(long, env = "JIRA_PROJECT", global = true)]
    jira_project: Option<String>,

    /// GitHub web URL (github.com or a GitHub Enterprise host)
    #[arg(long, env = "GITHUB_SERVER_URL", global = true)]
    github_url: Option<String>,

    /// Comma-separated labels that mark an issue as not yet triaged
    #[arg(long, env = "REQUIRE_MISSING_LABELS", global = true)]
    require_missing_labels: Option<String>,

    /// Comma-separated labels added to every Jira issue
    #[arg(long, env = "ADDITIONAL_LABELS", global = true)]
    additional_labels: Option<String>,

    /// Comma-separated emails that should watch synced issues
    #[arg(long, env = "ADD_WATCHERS", global = true)]
    add_watchers: Option<String>,

    /// Comma-separated emails that should not watch synced issues
    #[arg(long, env = "REMOVE_WATCHERS", global = true)]
    remove_watchers: Option<String>,

    /// Maximum concurrent watcher requests
    #[arg(long, env = "WATCHER_CONCURRENCY", global = true)]
    watcher_concurrency: Option<usize>,
}

impl From<OverrideArgs> for ConfigOverrides {
    fn from(args: OverrideArgs) -> Self {
        ConfigOverrides {
            jira_base_url: args.jira_base_url,
            jira_project: args.jira_project,
            github_url: args.github_url,
            require_missing_labels: args.require_missing_labels,
            additional_labels: args.additional_labels,
            add_watchers: args.add_watchers,
            remove_watchers: args.remove_watchers,
            watcher_concurrency: args.watcher_concurrency,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sync one GitHub issue into Jira
    Reconcile {
        /// Issue as owner/repo#number (default: read from the Actions event)
        #[arg(short, long)]
        issue: Option<String>,

        /// Webhook payload to read the issue from
        #[arg(long, env = "GITHUB_EVENT_PATH")]
        event_path: Option<PathBuf>,

        /// Repository used when the payload does not name one
        #[arg(long, env = "GITHUB_REPOSITORY")]
        repository: Option<String>,
    },

    /// Apply the watcher policy to one Jira issue
    Watchers {
        /// REST URL of the Jira issue
        #[arg(long)]
        issue_url: String,
    },

    /// Validate configuration and print warnings
    CheckConfig,
}

fn main() {
    // Initialize logging
    if let Err(e) = jira_sync::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> jira_sync::Result<()> {
    let mut config = match cli.config {
        Some(ref path) => SyncConfig::load(path)?,
        None => SyncConfig::default(),
    };
    config.apply_overrides(cli.overrides.into());

    for warning in config_warnings(&config) {
        tracing::warn!("{}", warning);
    }
    validate_config_result(&config)?;

    if let Commands::CheckConfig = cli.command {
        println!("Configuration OK");
        println!("  Jira:     {} ({})", config.jira.url, config.jira.project);
        println!("  GitHub:   {}", config.github.url);
        println!(
            "  Watchers: +{} / -{} (concurrency {})",
            config.watchers.add.len(),
            config.watchers.remove.len(),
            config.watchers.concurrency
        );
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let jira = JiraAdapter::new(config.jira.clone())?;
    if !jira.is_authenticated() {
        tracing::warn!("No Jira token found, requests will be anonymous");
    }

    match cli.command {
        Commands::Reconcile {
            issue,
            event_path,
            repository,
        } => {
            let issue = match (issue, event_path) {
                (Some(key), _) => IssueRef::parse(&key)?,
                (None, Some(path)) => {
                    match IssueRef::from_event_file(&path, repository.as_deref())? {
                        Some(issue) => issue,
                        None => {
                            tracing::info!("Not an issue, skipping");
                            println!("Not an issue");
                            return Ok(());
                        }
                    }
                }
                (None, None) => {
                    return Err(jira_sync::SyncError::Config(
                        "Pass --issue or set GITHUB_EVENT_PATH".to_string(),
                    ))
                }
            };

            let github = GitHubAdapter::new(&config.github)?;
            let summary = runtime.block_on(sync::run(&github, &jira, &config, &issue))?;
            print_summary(&issue, &summary);
        }
        Commands::Watchers { issue_url } => {
            let handle = JiraIssueHandle::new(issue_url);
            let outcome = runtime.block_on(sync::run_watchers(&jira, &handle, &config))?;
            print_watchers(&outcome);
        }
        Commands::CheckConfig => {}
    }

    Ok(())
}

fn print_summary(issue: &IssueRef, summary: &RunSummary) {
    println!("{}: {}", issue, summary.outcome.as_str());
    if let Some(ref outcome) = summary.watchers {
        print_watchers(outcome);
    }
}

fn print_watchers(outcome: &WatcherOutcome) {
    match outcome {
        WatcherOutcome::Disabled => println!("  watchers: disabled"),
        WatcherOutcome::Reconciled(report) => {
            println!(
                "  watchers: {} added, {} removed, {} failed",
                report.additions.successes().count(),
                report.removals.successes().count(),
                report.failure_count()
            );
        }
    }
}
