//! HTTP-level tests for the GitHub and GitLab clients against mock servers.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use issuemirror_core::errors::{GitHubError, GitLabError, SyncError};
use issuemirror_core::{DestinationTracker, GitHubClient, GitLabClient, IssueMirror, SourceTracker};

fn github(server: &MockServer) -> GitHubClient {
    GitHubClient::new(server.uri(), "acme", "widgets", "ghp_test").unwrap()
}

fn gitlab(server: &MockServer, project: &str) -> GitLabClient {
    GitLabClient::new(&format!("{}/api/v4", server.uri()), project, "glpat_test").unwrap()
}

// ===========================================================================
// GitHub
// ===========================================================================

#[tokio::test]
async fn test_github_get_issue_sends_api_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/issues/12"))
        .and(header("authorization", "Bearer ghp_test"))
        .and(header("accept", "application/vnd.github+json"))
        .and(header("x-github-api-version", "2022-11-28"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "number": 12,
            "title": "Crash on start",
            "body": null,
            "user": {"login": "octocat"},
            "html_url": "https://github.com/acme/widgets/issues/12"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let issue = github(&server).get_issue(12).await.unwrap();

    assert_eq!(issue.title, "Crash on start");
    assert_eq!(issue.body, "");
    assert_eq!(issue.user.login, "octocat");
}

#[tokio::test]
async fn test_github_comment_page_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/issues/12/comments"))
        .and(query_param("page", "2"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "body": "hi", "user": {"login": "a"}, "html_url": "u1"},
            {"id": 2, "body": null, "user": null, "html_url": "u2"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let comments = github(&server).list_comments_page(12, 2, 100).await.unwrap();

    assert_eq!(comments.len(), 2);
    assert_eq!(comments[1].body, "");
    assert_eq!(comments[1].user.login, "");
}

#[tokio::test]
async fn test_github_read_failure_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/issues/404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("{\"message\":\"Not Found\"}"))
        .mount(&server)
        .await;

    let err = github(&server).get_issue(404).await.unwrap_err();

    match err {
        GitHubError::ApiError { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("Not Found"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_github_rate_limit_and_auth_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/issues/1"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", "1700000000"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/issues/2"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
        .mount(&server)
        .await;

    let client = github(&server);
    assert!(matches!(
        client.get_issue(1).await,
        Err(GitHubError::RateLimited { ref reset_at }) if reset_at == "1700000000"
    ));
    assert!(matches!(
        client.get_issue(2).await,
        Err(GitHubError::AuthenticationFailed { status: 401, .. })
    ));
}

#[tokio::test]
async fn test_github_create_comment_requires_created_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/issues/5/comments"))
        .and(body_json(json!({"body": "hello"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 777, "body": "hello", "user": {"login": "bot"}, "html_url": "u"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/issues/6/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 778})))
        .mount(&server)
        .await;

    let client = github(&server);
    assert_eq!(client.create_comment(5, "hello").await.unwrap().id, 777);
    assert!(matches!(
        client.create_comment(6, "hello").await,
        Err(GitHubError::ApiError { status: 200, .. })
    ));
}

#[tokio::test]
async fn test_github_open_issue_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/issues"))
        .and(query_param("state", "open"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"number": 1, "title": "a", "html_url": "https://github.com/acme/widgets/issues/1"},
            {"number": 2, "title": "b", "html_url": "https://github.com/acme/widgets/pull/2",
             "pull_request": {"url": "https://api.github.com/repos/acme/widgets/pulls/2"}}
        ])))
        .mount(&server)
        .await;

    let issues = github(&server).list_open_issues_page(1, 50).await.unwrap();

    assert_eq!(issues.len(), 2);
    assert!(!issues[0].is_pull_request());
    assert!(issues[1].is_pull_request());
}

// ===========================================================================
// GitLab
// ===========================================================================

#[tokio::test]
async fn test_gitlab_create_issue_encodes_project_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects/acme%2Fwidgets/issues"))
        .and(header("authorization", "Bearer glpat_test"))
        .and(body_json(json!({"title": "T", "description": "D"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 90001, "iid": 14, "web_url": "https://gitlab.example/acme/widgets/-/issues/14"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = gitlab(&server, "acme/widgets")
        .create_issue("T", "D")
        .await
        .unwrap();

    assert_eq!(created.iid, Some(14));
    assert!(created.raw.contains("90001"));
}

#[tokio::test]
async fn test_gitlab_create_issue_without_iid_is_returned_raw() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects/42/issues"))
        .respond_with(ResponseTemplate::new(201).set_body_string("not json"))
        .mount(&server)
        .await;

    let created = gitlab(&server, "42").create_issue("T", "D").await.unwrap();

    assert_eq!(created.iid, None);
    assert_eq!(created.raw, "not json");
}

#[tokio::test]
async fn test_gitlab_rejected_issue_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects/42/issues"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("{\"message\":\"title is missing\"}"),
        )
        .mount(&server)
        .await;

    let err = gitlab(&server, "42").create_issue("", "D").await.unwrap_err();

    assert!(matches!(
        err,
        GitLabError::ApiError { status: 400, ref body } if body.contains("title is missing")
    ));
}

#[tokio::test]
async fn test_gitlab_notes_create_update_and_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/42/issues/3/notes"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 11, "body": "x\ngithub-comment-id:5", "system": false}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects/42/issues/3/notes"))
        .and(body_json(json!({"body": "new"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 12, "body": "new"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v4/projects/42/issues/3/notes/11"))
        .and(body_json(json!({"body": "edited"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 11, "body": "edited"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = gitlab(&server, "42");
    let notes = client.list_notes_page(3, 1, 100).await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].id, 11);
    assert_eq!(client.create_note(3, "new").await.unwrap().id, 12);
    client.update_note(3, 11, "edited").await.unwrap();
}

#[tokio::test]
async fn test_gitlab_failed_update_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v4/projects/42/issues/3/notes/11"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let err = gitlab(&server, "42").update_note(3, 11, "x").await.unwrap_err();

    assert!(matches!(err, GitLabError::AuthenticationFailed { status: 403, .. }));
}

// ===========================================================================
// Full sync over HTTP
// ===========================================================================

#[tokio::test]
async fn test_sync_issue_over_http_creates_and_links() {
    let gh = MockServer::start().await;
    let gl = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/issues/8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "number": 8, "title": "Docs typo", "body": "In README\r\n",
            "user": {"login": "octocat"},
            "html_url": "https://github.com/acme/widgets/issues/8"
        })))
        .mount(&gh)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/issues/8/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 801, "body": "Fixed in #9", "user": {"login": "alice"},
             "html_url": "https://github.com/acme/widgets/issues/8#issuecomment-801"}
        ])))
        .expect(1)
        .mount(&gh)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/issues/8/comments"))
        .and(body_json(json!({
            "body": "Created gitlab issue: https://gitlab.example/acme/widgets/-/issues/3\ngitlab-issue-id:3"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 802})))
        .expect(1)
        .mount(&gh)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v4/projects/acme%2Fwidgets/issues"))
        .and(body_json(json!({
            "title": "Docs typo",
            "description": "In README\n\n\nGithub reference: https://github.com/acme/widgets/issues/8"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "iid": 3, "web_url": "https://gitlab.example/acme/widgets/-/issues/3"
        })))
        .expect(1)
        .mount(&gl)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/acme%2Fwidgets/issues/3/notes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&gl)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects/acme%2Fwidgets/issues/3/notes"))
        .and(body_json(json!({
            "body": "From @alice\n\nFixed in #9\n\nLink: https://github.com/acme/widgets/issues/8#issuecomment-801\n\ngithub-comment-id:801"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&gl)
        .await;

    let m = IssueMirror::new(github(&gh), gitlab(&gl, "acme/widgets"));
    let report = m.sync_issue(8).await.unwrap();

    assert!(report.issue_created);
    assert_eq!(report.destination_issue, 3);
    assert_eq!(report.comments.created, 1);
}

#[tokio::test]
async fn test_sync_issue_over_http_aborts_on_rejected_note() {
    let gh = MockServer::start().await;
    let gl = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/issues/8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "number": 8, "title": "t", "body": "b", "user": {"login": "o"}, "html_url": "u"
        })))
        .mount(&gh)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/issues/8/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "body": "gitlab-issue-id:3", "user": {"login": "bot"}, "html_url": "u"},
            {"id": 2, "body": "a", "user": {"login": "x"}, "html_url": "u"},
            {"id": 3, "body": "b", "user": {"login": "y"}, "html_url": "u"}
        ])))
        .mount(&gh)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/42/issues/3/notes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&gl)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects/42/issues/3/notes"))
        .respond_with(ResponseTemplate::new(422).set_body_string("{\"message\":\"spam\"}"))
        .expect(1)
        .mount(&gl)
        .await;

    let m = IssueMirror::new(github(&gh), gitlab(&gl, "42"));
    let err = m.sync_issue(8).await.unwrap_err();

    match err {
        SyncError::CommentCreateFailed { comment_id, source } => {
            assert_eq!(comment_id, 2);
            assert!(matches!(source, GitLabError::ApiError { status: 422, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}
