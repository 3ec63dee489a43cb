//! Marker lines that tie the two trackers together.
//!
//! Cross-tracker identity is never stored outside the trackers themselves.
//! Instead two kinds of self-describing lines are written into comment bodies:
//!
//! - `gitlab-issue-id:<iid>` in a GitHub comment records which GitLab issue
//!   mirrors that GitHub issue (the *linkage* marker).
//! - `github-comment-id:<id>` at the end of every mirrored GitLab note records
//!   which GitHub comment produced it (the *cross-post* marker).
//!
//! Both formats are a wire contract with earlier runs and must not change.

use std::sync::OnceLock;

use regex_lite::Regex;

use crate::models::SourceComment;

/// Prefix of the linkage marker line.
pub const LINKAGE_MARKER_PREFIX: &str = "gitlab-issue-id:";

/// Prefix of the cross-post marker line.
pub const CROSS_POST_MARKER_PREFIX: &str = "github-comment-id:";

fn linkage_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^gitlab-issue-id:(\d+)").expect("valid linkage regex"))
}

fn cross_post_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^github-comment-id:(\d+)").expect("valid cross-post regex"))
}

/// Return the id captured by `re` on the first matching line of `body`.
///
/// Lines are split on `\n` only; a trailing `\r` never reaches the digits.
fn first_marker(re: &Regex, body: &str) -> Option<u64> {
    body.split('\n').find_map(|line| {
        re.captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
    })
}

/// Format the linkage marker line for a GitLab issue.
pub fn linkage_marker(destination_iid: u64) -> String {
    format!("{LINKAGE_MARKER_PREFIX}{destination_iid}")
}

/// Format the cross-post marker line for a GitHub comment.
pub fn cross_post_marker(source_comment_id: u64) -> String {
    format!("{CROSS_POST_MARKER_PREFIX}{source_comment_id}")
}

/// Extract the GitLab issue id from the first linkage marker line in `body`.
pub fn find_linkage_marker(body: &str) -> Option<u64> {
    first_marker(linkage_re(), body)
}

/// Extract the GitHub comment id from the first cross-post marker line in `body`.
pub fn find_cross_post_marker(body: &str) -> Option<u64> {
    first_marker(cross_post_re(), body)
}

/// A linkage marker found in the GitHub comment stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Linkage {
    pub destination_iid: u64,
    /// Id of the GitHub comment that carries the marker.
    pub comment_id: u64,
}

/// Scan comments in order and return the first linkage marker.
pub fn find_linkage(comments: &[SourceComment]) -> Option<Linkage> {
    comments.iter().find_map(|c| {
        find_linkage_marker(&c.body).map(|destination_iid| Linkage {
            destination_iid,
            comment_id: c.id,
        })
    })
}

/// Body of the comment announcing a newly created GitLab issue on GitHub.
pub fn announcement_body(web_url: &str, destination_iid: u64) -> String {
    format!(
        "Created gitlab issue: {web_url}\n{}",
        linkage_marker(destination_iid)
    )
}

/// Description of a new GitLab issue mirroring a GitHub issue.
pub fn issue_description(body: &str, html_url: &str) -> String {
    format!(
        "{}\n\nGithub reference: {html_url}",
        body.replace("\r\n", "\n")
    )
}

/// The GitLab note body that mirrors `comment`.
pub fn canonical_comment_body(comment: &SourceComment) -> String {
    format!(
        "From @{}\n\n{}\n\nLink: {}\n\n{}",
        comment.user.login,
        comment.body,
        comment.html_url,
        cross_post_marker(comment.id)
    )
}

/// Compare two note bodies ignoring carriage returns.
pub fn bodies_match(stored: &str, canonical: &str) -> bool {
    stored.chars().filter(|&c| c != '\r').eq(canonical.chars().filter(|&c| c != '\r'))
}
