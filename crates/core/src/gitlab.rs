//! GitLab REST API (v4) client (destination tracker).

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{StatusCode, Url};
use tracing::{debug, info, instrument};

use crate::errors::GitLabError;
use crate::models::{CreatedIssue, DestinationComment};
use crate::tracker::DestinationTracker;

/// Build the v4 API root for a GitLab domain.
///
/// A bare domain (`gitlab.com`) is served over HTTPS; a domain that already
/// carries a scheme is used as given.
pub fn api_url_for_domain(domain: &str) -> String {
    let domain = domain.trim_end_matches('/');
    if domain.starts_with("http://") || domain.starts_with("https://") {
        format!("{domain}/api/v4")
    } else {
        format!("https://{domain}/api/v4")
    }
}

/// Asynchronous GitLab REST API client bound to one project.
#[derive(Clone)]
pub struct GitLabClient {
    http: reqwest::Client,
    api_url: Url,
    project: String,
    token: String,
}

impl GitLabClient {
    /// `api_url` is the v4 API root, e.g. `https://gitlab.com/api/v4`.
    /// `project` is a numeric id or a `namespace/name` path.
    pub fn new(
        api_url: &str,
        project: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, GitLabError> {
        let api_url = Url::parse(api_url).map_err(|e| GitLabError::InvalidUrl {
            url: api_url.to_string(),
            detail: e.to_string(),
        })?;
        if api_url.cannot_be_a_base() {
            return Err(GitLabError::InvalidUrl {
                url: api_url.to_string(),
                detail: "not a base URL".into(),
            });
        }
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("issuemirror/0.1"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        let client = Self {
            http,
            api_url,
            project: project.into(),
            token: token.into(),
        };
        info!(api_url = %client.api_url, project = %client.project, "created GitLabClient");
        Ok(client)
    }

    /// `{api}/projects/{project}/issues/{tail...}` with the project path
    /// encoded as a single segment.
    fn issues_url(&self, tail: &[&str]) -> Result<Url, GitLabError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| GitLabError::InvalidUrl {
                url: self.api_url.to_string(),
                detail: "not a base URL".into(),
            })?
            .pop_if_empty()
            .extend(["projects", self.project.as_str(), "issues"])
            .extend(tail);
        Ok(url)
    }
}

#[async_trait]
impl DestinationTracker for GitLabClient {
    #[instrument(skip(self, description))]
    async fn create_issue(
        &self,
        title: &str,
        description: &str,
    ) -> Result<CreatedIssue, GitLabError> {
        let url = self.issues_url(&[])?;
        let payload = serde_json::json!({ "title": title, "description": description });
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;
        let resp = check_response(resp, None).await?;
        let raw = resp.text().await?;
        let mut created: CreatedIssue = serde_json::from_str(&raw).unwrap_or_default();
        created.raw = raw;
        debug!(iid = ?created.iid, "issue creation accepted");
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn list_notes_page(
        &self,
        issue_iid: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<DestinationComment>, GitLabError> {
        let iid = issue_iid.to_string();
        let url = self.issues_url(&[&iid, "notes"])?;
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(&[("page", page), ("per_page", per_page)])
            .send()
            .await?;
        let resp = check_response(resp, None).await?;
        let text = resp.text().await?;
        let notes: Vec<DestinationComment> =
            serde_json::from_str(&text).map_err(|e| GitLabError::ParseError(e.to_string()))?;
        debug!(count = notes.len(), "fetched issue notes");
        Ok(notes)
    }

    #[instrument(skip(self, body))]
    async fn create_note(
        &self,
        issue_iid: u64,
        body: &str,
    ) -> Result<DestinationComment, GitLabError> {
        let iid = issue_iid.to_string();
        let url = self.issues_url(&[&iid, "notes"])?;
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?;
        let resp = check_response(resp, Some(StatusCode::CREATED)).await?;
        let text = resp.text().await?;
        let note: DestinationComment =
            serde_json::from_str(&text).map_err(|e| GitLabError::ParseError(e.to_string()))?;
        info!(note_id = note.id, "created issue note");
        Ok(note)
    }

    #[instrument(skip(self, body))]
    async fn update_note(
        &self,
        issue_iid: u64,
        note_id: u64,
        body: &str,
    ) -> Result<(), GitLabError> {
        let iid = issue_iid.to_string();
        let note = note_id.to_string();
        let url = self.issues_url(&[&iid, "notes", &note])?;
        let resp = self
            .http
            .put(url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?;
        check_response(resp, None).await?;
        info!(note_id, "updated issue note");
        Ok(())
    }
}

/// Map an unexpected status to a [`GitLabError`], keeping the response body.
///
/// With `expected` set, only that exact status passes; otherwise any 2xx does.
async fn check_response(
    resp: reqwest::Response,
    expected: Option<StatusCode>,
) -> Result<reqwest::Response, GitLabError> {
    let status = resp.status();
    let ok = match expected {
        Some(code) => status == code,
        None => status.is_success(),
    };
    if ok {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let err = match status.as_u16() {
        code @ (401 | 403) => GitLabError::AuthenticationFailed { status: code, body },
        code => GitLabError::ApiError { status: code, body },
    };
    Err(err)
}
