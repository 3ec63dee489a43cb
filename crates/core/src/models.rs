//! Data types shared by the trackers, the resolver and the reconciler.
//!
//! Tracker responses are deserialized straight into these structs. Fields the
//! trackers may return as `null` (issue and comment bodies, deleted users) are
//! normalized to empty text so nothing downstream has to handle them.

use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize a nullable string as an empty string.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a nullable user object as the default (empty login).
fn null_user<'de, D>(deserializer: D) -> Result<IssueUser, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<IssueUser>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Source side (GitHub)
// ---------------------------------------------------------------------------

/// The author of a GitHub issue or comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueUser {
    #[serde(default)]
    pub login: String,
}

/// A GitHub issue as returned by `GET /repos/{owner}/{repo}/issues/{number}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceIssue {
    pub number: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    #[serde(default, deserialize_with = "null_user")]
    pub user: IssueUser,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub html_url: String,
    /// Present (as an object) when the "issue" is really a pull request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<serde_json::Value>,
}

impl SourceIssue {
    /// Whether GitHub reports this entry as a pull request.
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// A comment on a GitHub issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceComment {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    #[serde(default, deserialize_with = "null_user")]
    pub user: IssueUser,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub html_url: String,
}

// ---------------------------------------------------------------------------
// Destination side (GitLab)
// ---------------------------------------------------------------------------

/// A GitLab issue that mirrors a GitHub issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationIssue {
    /// Project-scoped issue id (`iid`).
    pub iid: u64,
    pub web_url: String,
}

/// The response to `POST /projects/{id}/issues`.
///
/// Both fields are optional: a success status with no `iid` is reported by
/// the resolver together with the raw response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIssue {
    #[serde(default)]
    pub iid: Option<u64>,
    #[serde(default)]
    pub web_url: Option<String>,
    /// The response body exactly as received.
    #[serde(skip)]
    pub raw: String,
}

impl CreatedIssue {
    /// Convert into a [`DestinationIssue`] if the response carried an `iid`.
    pub fn into_issue(self) -> Option<DestinationIssue> {
        let iid = self.iid?;
        Some(DestinationIssue {
            iid,
            web_url: self.web_url.unwrap_or_default(),
        })
    }
}

/// A note (comment) on a GitLab issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationComment {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
}
