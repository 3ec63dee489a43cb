//! GitHub REST API client (source tracker).

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use crate::errors::GitHubError;
use crate::models::{SourceComment, SourceIssue};
use crate::tracker::SourceTracker;

/// Asynchronous GitHub REST API client bound to one repository.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    owner: String,
    repo: String,
    token: String,
}

impl GitHubClient {
    pub fn new(
        api_url: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, GitHubError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("issuemirror/0.1"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        let client = Self {
            http,
            api_url,
            owner: owner.into(),
            repo: repo.into(),
            token: token.into(),
        };
        info!(api_url = %client.api_url, repo = %client.repo_slug(), "created GitHubClient");
        Ok(client)
    }

    /// `owner/repo`.
    pub fn repo_slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    fn issues_url(&self) -> String {
        format!("{}/repos/{}/{}/issues", self.api_url, self.owner, self.repo)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, GitHubError> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;
        let resp = check_response(resp, None).await?;
        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|e| GitHubError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl SourceTracker for GitHubClient {
    #[instrument(skip(self))]
    async fn get_issue(&self, number: u64) -> Result<SourceIssue, GitHubError> {
        let url = format!("{}/{}", self.issues_url(), number);
        let issue: SourceIssue = self.get_json(&url, &[]).await?;
        debug!(number = issue.number, title = %issue.title, "fetched issue");
        Ok(issue)
    }

    #[instrument(skip(self))]
    async fn list_comments_page(
        &self,
        number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<SourceComment>, GitHubError> {
        let url = format!("{}/{}/comments", self.issues_url(), number);
        let query = [("page", page.to_string()), ("per_page", per_page.to_string())];
        let comments: Vec<SourceComment> = self.get_json(&url, &query).await?;
        debug!(count = comments.len(), "fetched issue comments");
        Ok(comments)
    }

    #[instrument(skip(self, body))]
    async fn create_comment(&self, number: u64, body: &str) -> Result<SourceComment, GitHubError> {
        let url = format!("{}/{}/comments", self.issues_url(), number);
        let payload = serde_json::json!({ "body": body });
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;
        let resp = check_response(resp, Some(StatusCode::CREATED)).await?;
        let text = resp.text().await?;
        let comment: SourceComment =
            serde_json::from_str(&text).map_err(|e| GitHubError::ParseError(e.to_string()))?;
        info!(comment_id = comment.id, "created issue comment");
        Ok(comment)
    }

    #[instrument(skip(self))]
    async fn list_open_issues_page(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<SourceIssue>, GitHubError> {
        let query = [
            ("state", "open".to_string()),
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        let issues: Vec<SourceIssue> = self.get_json(&self.issues_url(), &query).await?;
        debug!(count = issues.len(), "fetched open issues");
        Ok(issues)
    }
}

/// Map an unexpected status to a [`GitHubError`], keeping the response body.
///
/// With `expected` set, only that exact status passes; otherwise any 2xx does.
async fn check_response(
    resp: reqwest::Response,
    expected: Option<StatusCode>,
) -> Result<reqwest::Response, GitHubError> {
    let status = resp.status();
    let ok = match expected {
        Some(code) => status == code,
        None => status.is_success(),
    };
    if ok {
        return Ok(resp);
    }

    let rate_limit_exhausted = resp
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        == Some("0");
    let reset_at = resp
        .headers()
        .get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let body = resp.text().await.unwrap_or_default();

    let err = match status.as_u16() {
        429 => GitHubError::RateLimited { reset_at },
        403 if rate_limit_exhausted => GitHubError::RateLimited { reset_at },
        401 | 403 => GitHubError::AuthenticationFailed {
            status: status.as_u16(),
            body,
        },
        code => GitHubError::ApiError { status: code, body },
    };
    Err(err)
}
