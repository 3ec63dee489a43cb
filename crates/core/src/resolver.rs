//! Identity resolution: find or create the GitLab issue mirroring a GitHub
//! issue.
//!
//! The link between the two issues is recorded only as a linkage marker line
//! (`gitlab-issue-id:<iid>`) in a comment on the GitHub issue. Resolution
//! therefore re-derives the link from the comment stream on every run:
//!
//! 1. Fetch the GitHub issue and all of its comments.
//! 2. The first comment with a linkage marker line names the GitLab issue.
//! 3. Otherwise create the GitLab issue and announce it with a new GitHub
//!    comment carrying the marker, so the next run finds it.

use tracing::{error, info, instrument};

use crate::errors::SyncError;
use crate::markers::{announcement_body, find_linkage, issue_description};
use crate::models::{SourceComment, SourceIssue};
use crate::paginate::{fetch_all, COMMENTS_PAGE_SIZE};
use crate::tracker::{DestinationTracker, SourceTracker};

/// Outcome of resolving one GitHub issue.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Snapshot of the GitHub issue.
    pub issue: SourceIssue,
    /// Every comment on the GitHub issue at the time of the fetch, oldest first.
    pub comments: Vec<SourceComment>,
    /// The GitLab issue `iid` mirroring this issue.
    pub destination_iid: u64,
    /// The GitHub comment that carries the linkage marker. It announces the
    /// link and is never mirrored.
    pub announcement_comment_id: Option<u64>,
    /// Whether the GitLab issue was created by this run.
    pub created: bool,
}

/// Finds or establishes the GitLab counterpart of a GitHub issue.
pub struct IdentityResolver<'a, S, D> {
    source: &'a S,
    destination: &'a D,
}

impl<'a, S, D> IdentityResolver<'a, S, D>
where
    S: SourceTracker,
    D: DestinationTracker,
{
    pub fn new(source: &'a S, destination: &'a D) -> Self {
        Self {
            source,
            destination,
        }
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, issue_number: u64) -> Result<Resolution, SyncError> {
        let issue = self.source.get_issue(issue_number).await?;
        info!(issue = issue_number, title = %issue.title, "found GitHub issue");

        let comments = fetch_all(COMMENTS_PAGE_SIZE, |page, per_page| {
            self.source.list_comments_page(issue_number, page, per_page)
        })
        .await?;
        info!(issue = issue_number, count = comments.len(), "found GitHub issue comments");

        if let Some(link) = find_linkage(&comments) {
            info!(
                issue = issue_number,
                destination_iid = link.destination_iid,
                comment_id = link.comment_id,
                "found GitLab issue from GitHub comment"
            );
            return Ok(Resolution {
                issue,
                comments,
                destination_iid: link.destination_iid,
                announcement_comment_id: Some(link.comment_id),
                created: false,
            });
        }

        info!(issue = issue_number, "no linked GitLab issue, creating one");
        let description = issue_description(&issue.body, &issue.html_url);
        let created = self
            .destination
            .create_issue(&issue.title, &description)
            .await
            .map_err(|source| SyncError::IssueCreationFailed {
                issue: issue_number,
                source,
            })?;
        let raw = created.raw.clone();
        let destination = created
            .into_issue()
            .ok_or(SyncError::UnusableIssueResponse { response: raw })?;
        info!(
            issue = issue_number,
            destination_iid = destination.iid,
            web_url = %destination.web_url,
            "created GitLab issue"
        );

        let announcement = self
            .source
            .create_comment(
                issue_number,
                &announcement_body(&destination.web_url, destination.iid),
            )
            .await
            .map_err(|source| {
                error!(
                    issue = issue_number,
                    destination_iid = destination.iid,
                    "GitLab issue created but left unlinked; the next run will create another"
                );
                SyncError::LinkageCommentFailed {
                    issue: issue_number,
                    destination_issue: destination.iid,
                    source,
                }
            })?;
        info!(
            issue = issue_number,
            comment_id = announcement.id,
            "posted linkage comment on GitHub issue"
        );

        Ok(Resolution {
            issue,
            comments,
            destination_iid: destination.iid,
            announcement_comment_id: Some(announcement.id),
            created: true,
        })
    }
}
