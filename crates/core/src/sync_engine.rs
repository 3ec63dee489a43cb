//! One-way GitHub → GitLab issue synchronization engine.
//!
//! The [`IssueMirror`] drives each sync of a single issue:
//!
//! 1. Resolve the GitLab issue for the GitHub issue, creating and linking it
//!    if needed ([`IdentityResolver`]).
//! 2. Reconcile the GitLab notes against the GitHub comments
//!    ([`CommentReconciler`]).
//!
//! Every call re-derives its state from the trackers, so runs are
//! independent and repeated runs are idempotent. A periodic caller uses
//! [`IssueMirror::sync_open_issues`] to process every open issue in turn.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::MirrorConfig;
use crate::errors::{CoreError, SyncError};
use crate::github::GitHubClient;
use crate::gitlab::GitLabClient;
use crate::paginate::{fetch_all, ISSUES_PAGE_SIZE};
use crate::reconciler::{CommentReconciler, ReconcileStats};
use crate::resolver::IdentityResolver;
use crate::tracker::{DestinationTracker, SourceTracker};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Result of syncing one GitHub issue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    pub source_issue: u64,
    pub destination_issue: u64,
    pub issue_created: bool,
    pub comments: ReconcileStats,
    pub started_at: String,
    pub completed_at: Option<String>,
}

impl SyncReport {
    /// Number of mutating calls issued (issue creation counts as two: the
    /// GitLab issue and the GitHub linkage comment).
    pub fn mutations(&self) -> usize {
        let link = if self.issue_created { 2 } else { 0 };
        link + self.comments.mutations()
    }
}

/// A GitHub issue whose sync failed during a cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedIssue {
    pub source_issue: u64,
    pub error: String,
}

/// Result of syncing every open GitHub issue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleReport {
    pub synced: Vec<SyncReport>,
    pub failed: Vec<FailedIssue>,
    pub started_at: String,
    pub completed_at: Option<String>,
}

impl CycleReport {
    pub fn issues_seen(&self) -> usize {
        self.synced.len() + self.failed.len()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Mirrors GitHub issues of one repository into one GitLab project.
pub struct IssueMirror<S, D> {
    source: S,
    destination: D,
}

/// An [`IssueMirror`] talking to the real trackers over HTTP.
pub type HttpIssueMirror = IssueMirror<GitHubClient, GitLabClient>;

impl HttpIssueMirror {
    /// Validate `config` and build the HTTP clients for both trackers.
    pub fn from_config(config: &MirrorConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let source = GitHubClient::new(
            &config.github.api_url,
            &config.github.org,
            &config.github.repo,
            config.github.token.clone().unwrap_or_default(),
        )?;
        let destination = GitLabClient::new(
            &config.gitlab.api_url(),
            &config.gitlab.project,
            config.gitlab.token.clone().unwrap_or_default(),
        )?;
        Ok(Self::new(source, destination))
    }
}

impl<S, D> IssueMirror<S, D>
where
    S: SourceTracker,
    D: DestinationTracker,
{
    pub fn new(source: S, destination: D) -> Self {
        info!("initializing issue mirror");
        Self {
            source,
            destination,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn destination(&self) -> &D {
        &self.destination
    }

    /// Sync one GitHub issue and its comments to GitLab.
    #[instrument(skip(self))]
    pub async fn sync_issue(&self, issue_number: u64) -> Result<SyncReport, SyncError> {
        let started_at = Utc::now().to_rfc3339();

        let resolution = IdentityResolver::new(&self.source, &self.destination)
            .resolve(issue_number)
            .await?;

        let comments = CommentReconciler::new(&self.destination)
            .reconcile(
                resolution.destination_iid,
                &resolution.comments,
                resolution.announcement_comment_id,
            )
            .await?;

        let report = SyncReport {
            source_issue: issue_number,
            destination_issue: resolution.destination_iid,
            issue_created: resolution.created,
            comments,
            started_at,
            completed_at: Some(Utc::now().to_rfc3339()),
        };
        info!(
            issue = issue_number,
            destination_iid = report.destination_issue,
            issue_created = report.issue_created,
            mutations = report.mutations(),
            "issue sync complete"
        );
        Ok(report)
    }

    /// Numbers of all open GitHub issues, pull requests excluded, oldest
    /// listing order preserved.
    #[instrument(skip(self))]
    pub async fn list_open_issue_numbers(&self) -> Result<Vec<u64>, SyncError> {
        let issues = fetch_all(ISSUES_PAGE_SIZE, |page, per_page| {
            self.source.list_open_issues_page(page, per_page)
        })
        .await?;
        let total = issues.len();
        let numbers: Vec<u64> = issues
            .into_iter()
            .filter(|issue| !issue.is_pull_request())
            .map(|issue| issue.number)
            .collect();
        info!(
            open = total,
            issues = numbers.len(),
            pull_requests = total - numbers.len(),
            "enumerated open GitHub issues"
        );
        Ok(numbers)
    }

    /// Sync every open GitHub issue, one after another.
    ///
    /// A failure on one issue is recorded and the remaining issues are still
    /// processed. Only a failure to enumerate the issues aborts the cycle.
    pub async fn sync_open_issues(&self) -> Result<CycleReport, SyncError> {
        let mut report = CycleReport {
            started_at: Utc::now().to_rfc3339(),
            ..Default::default()
        };

        for number in self.list_open_issue_numbers().await? {
            match self.sync_issue(number).await {
                Ok(issue_report) => report.synced.push(issue_report),
                Err(e) => {
                    error!(issue = number, error = %e, "issue sync failed");
                    report.failed.push(FailedIssue {
                        source_issue: number,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.completed_at = Some(Utc::now().to_rfc3339());
        Ok(report)
    }
}
