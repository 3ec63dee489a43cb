//! The tracker operations the sync algorithm depends on.
//!
//! [`GitHubClient`](crate::github::GitHubClient) and
//! [`GitLabClient`](crate::gitlab::GitLabClient) implement these over HTTP;
//! the integration tests implement them in memory.

use async_trait::async_trait;

use crate::errors::{GitHubError, GitLabError};
use crate::models::{CreatedIssue, DestinationComment, SourceComment, SourceIssue};

/// Read/write surface of the source tracker (GitHub), scoped to one repository.
#[async_trait]
pub trait SourceTracker: Send + Sync {
    /// Fetch a single issue.
    async fn get_issue(&self, number: u64) -> Result<SourceIssue, GitHubError>;

    /// Fetch one page of comments on an issue, oldest first.
    async fn list_comments_page(
        &self,
        number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<SourceComment>, GitHubError>;

    /// Post a comment on an issue. Only an HTTP 201 response is a success.
    async fn create_comment(&self, number: u64, body: &str) -> Result<SourceComment, GitHubError>;

    /// Fetch one page of open issues (pull requests included, as GitHub
    /// reports them).
    async fn list_open_issues_page(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<SourceIssue>, GitHubError>;
}

/// Read/write surface of the destination tracker (GitLab), scoped to one project.
#[async_trait]
pub trait DestinationTracker: Send + Sync {
    /// Create an issue. A success response is returned as-is even when it
    /// carries no `iid`.
    async fn create_issue(&self, title: &str, description: &str)
        -> Result<CreatedIssue, GitLabError>;

    /// Fetch one page of notes on an issue.
    async fn list_notes_page(
        &self,
        issue_iid: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<DestinationComment>, GitLabError>;

    /// Post a note on an issue. Only an HTTP 201 response is a success.
    async fn create_note(&self, issue_iid: u64, body: &str)
        -> Result<DestinationComment, GitLabError>;

    /// Replace the body of an existing note.
    async fn update_note(&self, issue_iid: u64, note_id: u64, body: &str)
        -> Result<(), GitLabError>;
}
