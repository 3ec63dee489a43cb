//! Error types for the IssueMirror core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    GitLab(#[from] GitLabError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

// ---------------------------------------------------------------------------
// GitHub API errors
// ---------------------------------------------------------------------------

/// Errors from GitHub REST API interactions (the source tracker).
#[derive(Debug, Error)]
pub enum GitHubError {
    /// HTTP-level transport error (network, TLS, etc.).
    #[error("GitHub HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API returned a status other than the one the call requires.
    #[error("GitHub API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    /// Authentication token is missing or invalid.
    #[error("GitHub authentication failed (HTTP {status}): {body}")]
    AuthenticationFailed { status: u16, body: String },

    /// Rate limit exceeded.
    #[error("GitHub rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    /// JSON deserialization failure.
    #[error("GitHub response parse error: {0}")]
    ParseError(String),
}

// ---------------------------------------------------------------------------
// GitLab API errors
// ---------------------------------------------------------------------------

/// Errors from GitLab REST API interactions (the destination tracker).
#[derive(Debug, Error)]
pub enum GitLabError {
    /// HTTP-level transport error (network, TLS, etc.).
    #[error("GitLab HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API returned a status other than the one the call requires.
    #[error("GitLab API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    /// Authentication token is missing or invalid.
    #[error("GitLab authentication failed (HTTP {status}): {body}")]
    AuthenticationFailed { status: u16, body: String },

    /// The configured base URL or project path could not form a request URL.
    #[error("invalid GitLab URL '{url}': {detail}")]
    InvalidUrl { url: String, detail: String },

    /// JSON deserialization failure.
    #[error("GitLab response parse error: {0}")]
    ParseError(String),
}

// ---------------------------------------------------------------------------
// Sync errors
// ---------------------------------------------------------------------------

/// Errors from the identity resolver and comment reconciler.
#[derive(Debug, Error)]
pub enum SyncError {
    /// GitLab accepted the issue-creation request but the response carried
    /// no `iid` to link against.
    #[error("GitLab issue creation returned no usable issue id: {response}")]
    UnusableIssueResponse { response: String },

    /// The GitLab issue could not be created.
    #[error("failed to create GitLab issue for GitHub issue #{issue}: {source}")]
    IssueCreationFailed {
        issue: u64,
        #[source]
        source: GitLabError,
    },

    /// The linkage announcement could not be posted back to GitHub. The
    /// GitLab issue exists but is not linked.
    #[error(
        "created GitLab issue {destination_issue} but could not post the linkage comment \
         on GitHub issue #{issue}: {source}"
    )]
    LinkageCommentFailed {
        issue: u64,
        destination_issue: u64,
        #[source]
        source: GitHubError,
    },

    /// A mirrored comment could not be created on GitLab.
    #[error("failed to post GitHub comment {comment_id} to GitLab: {source}")]
    CommentCreateFailed {
        comment_id: u64,
        #[source]
        source: GitLabError,
    },

    /// A mirrored comment could not be updated on GitLab.
    #[error("failed to update GitLab note {note_id} for GitHub comment {comment_id}: {source}")]
    CommentUpdateFailed {
        comment_id: u64,
        note_id: u64,
        #[source]
        source: GitLabError,
    },

    /// A GitHub read failed.
    #[error("sync GitHub error: {0}")]
    GitHub(#[from] GitHubError),

    /// A GitLab read failed.
    #[error("sync GitLab error: {0}")]
    GitLab(#[from] GitLabError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A required value is empty or absent.
    #[error("'{field}' must be provided as an argument, config value, or environment variable {env}")]
    MissingValue { field: String, env: String },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = GitLabError::ApiError {
            status: 422,
            body: "{\"message\":\"title is missing\"}".into(),
        };
        assert_eq!(
            err.to_string(),
            "GitLab API error (HTTP 422): {\"message\":\"title is missing\"}"
        );

        let err = ConfigError::MissingValue {
            field: "github.token".into(),
            env: "GITHUB_TOKEN".into(),
        };
        assert!(err.to_string().contains("github.token"));
        assert!(err.to_string().contains("GITHUB_TOKEN"));

        let err = SyncError::UnusableIssueResponse {
            response: "{\"error\":\"nope\"}".into(),
        };
        assert!(err.to_string().contains("no usable issue id"));
    }

    #[test]
    fn test_mutation_errors_carry_status_and_body() {
        let err = SyncError::CommentCreateFailed {
            comment_id: 7,
            source: GitLabError::ApiError {
                status: 403,
                body: "forbidden".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("comment 7"));
        assert!(msg.contains("HTTP 403"));
        assert!(msg.contains("forbidden"));
    }

    #[test]
    fn test_core_error_from_subsystem() {
        let gh = GitHubError::ParseError("bad json".into());
        let core_err: CoreError = gh.into();
        assert!(matches!(core_err, CoreError::GitHub(_)));

        let sync_err: SyncError = GitLabError::ParseError("x".into()).into();
        let core_err: CoreError = sync_err.into();
        assert!(matches!(core_err, CoreError::Sync(SyncError::GitLab(_))));
    }
}
