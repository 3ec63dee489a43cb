//! IssueMirror command-line tool.
//!
//! Mirrors a single GitHub issue and its comments into a GitLab project, or
//! lists the open issues a periodic run would mirror. Every flag can also be
//! supplied through the environment variable shown in `--help`.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use issuemirror_core::config::{
    default_gitlab_domain, ENV_GITHUB_API_URL, ENV_GITHUB_ORG, ENV_GITHUB_REPO, ENV_GITHUB_TOKEN,
    ENV_GITLAB_DOMAIN, ENV_GITLAB_PROJECT, ENV_GITLAB_TOKEN, ENV_LOG_LEVEL,
};
use issuemirror_core::sync_engine::SyncReport;
use issuemirror_core::{HttpIssueMirror, MirrorConfig};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// IssueMirror command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "issuemirror",
    version,
    about = "Mirror GitHub issues and their comments into a GitLab project"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    #[arg(long, global = true, env = ENV_LOG_LEVEL, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sync one GitHub issue and its comments to GitLab.
    Sync {
        /// Number of the GitHub issue to mirror.
        #[arg(long, env = "GITHUB_ISSUE")]
        github_issue: u64,

        #[command(flatten)]
        target: TargetArgs,

        /// Print the sync report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the open GitHub issues (pull requests excluded).
    ListIssues {
        #[command(flatten)]
        target: TargetArgs,
    },
}

/// Source repository and destination project.
///
/// Empty values are accepted here and rejected by config validation, which
/// names the missing field.
#[derive(Args, Debug)]
struct TargetArgs {
    /// GitHub organization or user.
    #[arg(long, env = ENV_GITHUB_ORG, default_value = "", hide_default_value = true)]
    github_org: String,

    /// GitHub repository name.
    #[arg(long, env = ENV_GITHUB_REPO, default_value = "", hide_default_value = true)]
    github_repo: String,

    /// GitHub token.
    #[arg(
        long,
        env = ENV_GITHUB_TOKEN,
        default_value = "",
        hide_default_value = true,
        hide_env_values = true
    )]
    github_token: String,

    /// GitHub API base URL.
    #[arg(long, env = ENV_GITHUB_API_URL, default_value = "https://api.github.com")]
    github_api_url: String,

    /// GitLab project id or `namespace/name` path.
    #[arg(long, env = ENV_GITLAB_PROJECT, default_value = "", hide_default_value = true)]
    gitlab_project: String,

    /// GitLab token.
    #[arg(
        long,
        env = ENV_GITLAB_TOKEN,
        default_value = "",
        hide_default_value = true,
        hide_env_values = true
    )]
    gitlab_token: String,

    /// GitLab host, optionally with scheme.
    #[arg(long, env = ENV_GITLAB_DOMAIN, default_value_t = default_gitlab_domain())]
    gitlab_domain: String,
}

impl TargetArgs {
    fn into_config(self) -> MirrorConfig {
        let mut config = MirrorConfig::new(
            self.github_org,
            self.github_repo,
            self.github_token,
            self.gitlab_domain,
            self.gitlab_project,
            self.gitlab_token,
        );
        config.github.api_url = self.github_api_url;
        config
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Sync {
            github_issue,
            target,
            json,
        } => cmd_sync(github_issue, target.into_config(), json).await,
        Commands::ListIssues { target } => cmd_list_issues(target.into_config()).await,
    }
}

fn build_mirror(config: &MirrorConfig) -> Result<HttpIssueMirror> {
    HttpIssueMirror::from_config(config).context("invalid configuration")
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_sync(issue: u64, config: MirrorConfig, json: bool) -> Result<()> {
    let mirror = build_mirror(&config)?;
    info!(
        repo = %config.github_repo_slug(),
        issue,
        project = %config.gitlab.project,
        domain = %config.gitlab.domain,
        "syncing GitHub issue"
    );

    let report = mirror
        .sync_issue(issue)
        .await
        .with_context(|| format!("sync of GitHub issue #{issue} failed"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&config, &report);
    }
    Ok(())
}

async fn cmd_list_issues(config: MirrorConfig) -> Result<()> {
    let mirror = build_mirror(&config)?;
    let numbers = mirror
        .list_open_issue_numbers()
        .await
        .context("failed to list open GitHub issues")?;

    if numbers.is_empty() {
        println!("No open issues in {}.", config.github_repo_slug());
        return Ok(());
    }
    for number in numbers {
        println!("{number}");
    }
    Ok(())
}

fn print_report(config: &MirrorConfig, report: &SyncReport) {
    println!(
        "GitHub {}#{} -> GitLab {}#{}{}",
        config.github_repo_slug(),
        report.source_issue,
        config.gitlab.project,
        report.destination_issue,
        if report.issue_created { " (created)" } else { "" }
    );
    println!(
        "  comments: {} created, {} updated, {} up to date, {} skipped",
        report.comments.created,
        report.comments.updated,
        report.comments.unchanged,
        report.comments.skipped
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sync_flags_build_config() {
        let cli = Cli::try_parse_from([
            "issuemirror",
            "sync",
            "--github-issue",
            "12",
            "--github-org",
            "acme",
            "--github-repo",
            "widgets",
            "--github-token",
            "ghp",
            "--gitlab-project",
            "acme/widgets",
            "--gitlab-token",
            "glpat",
            "--gitlab-domain",
            "git.example.org",
        ])
        .unwrap();

        let Commands::Sync {
            github_issue,
            target,
            json,
        } = cli.command
        else {
            panic!("expected sync");
        };
        assert_eq!(github_issue, 12);
        assert!(!json);
        let config = target.into_config();
        config.validate().unwrap();
        assert_eq!(config.gitlab.api_url(), "https://git.example.org/api/v4");
        assert_eq!(config.github.token.as_deref(), Some("ghp"));
    }
}
