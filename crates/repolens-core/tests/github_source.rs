use pretty_assertions::assert_eq;
use repolens_core::github::GitHubSource;
use repolens_core::repo_ref::RepoRef;
use repolens_core::source::{FileEntry, RepositorySource, SourceError};
use secrecy::SecretBox;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn repo() -> RepoRef {
    RepoRef::new("octo", "widgets")
}

async fn mount_repo_details(server: &MockServer, branch: &str) {
    Mock::given(method("GET"))
        .and(path("/repos/octo/widgets"))
        .and(header("accept", "application/vnd.github.v3+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "full_name": "octo/widgets",
            "default_branch": branch,
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn list_files_keeps_blobs_from_default_branch_tree() {
    let server = MockServer::start().await;
    mount_repo_details(&server, "trunk").await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/widgets/git/trees/trunk"))
        .and(query_param("recursive", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "abc",
            "truncated": false,
            "tree": [
                {"path": "src", "type": "tree"},
                {"path": "src/lib.rs", "type": "blob", "size": 120},
                {"path": "README.md", "type": "blob", "size": 9},
                {"path": "vendor/dep", "type": "commit"}
            ]
        })))
        .mount(&server)
        .await;

    let source = GitHubSource::new(&server.uri(), None).expect("source");
    let files = source
        .list_files(&repo(), &CancellationToken::new())
        .await
        .expect("listing");

    assert_eq!(
        files,
        vec![
            FileEntry::new("src/lib.rs").with_size(120),
            FileEntry::new("README.md").with_size(9),
        ]
    );
}

#[tokio::test]
async fn token_is_sent_as_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/widgets"))
        .and(header("authorization", "token ghp_secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"default_branch": "main"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/widgets/git/trees/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tree": []})))
        .mount(&server)
        .await;

    let token = SecretBox::new(Box::new("ghp_secret".to_string()));
    let source = GitHubSource::new(&server.uri(), Some(token)).expect("source");

    let files = source
        .list_files(&repo(), &CancellationToken::new())
        .await
        .expect("listing");
    assert!(files.is_empty());
}

#[tokio::test]
async fn missing_repository_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/widgets"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&server)
        .await;

    let source = GitHubSource::new(&server.uri(), None).expect("source");
    let error = source
        .list_files(&repo(), &CancellationToken::new())
        .await
        .expect_err("should fail");

    assert_eq!(error, SourceError::NotFound("repository octo/widgets".to_string()));
}

#[tokio::test]
async fn exhausted_quota_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/widgets"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .set_body_json(json!({"message": "API rate limit exceeded"})),
        )
        .mount(&server)
        .await;

    let source = GitHubSource::new(&server.uri(), None).expect("source");
    let error = source
        .list_files(&repo(), &CancellationToken::new())
        .await
        .expect_err("should fail");

    assert_eq!(error, SourceError::RateLimited);
}

#[tokio::test]
async fn forbidden_with_quota_left_reports_status_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/widgets"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "42")
                .set_body_json(json!({"message": "Repository access blocked"})),
        )
        .mount(&server)
        .await;

    let source = GitHubSource::new(&server.uri(), None).expect("source");
    let error = source
        .list_files(&repo(), &CancellationToken::new())
        .await
        .expect_err("should fail");

    assert_eq!(
        error,
        SourceError::Status {
            status: 403,
            message: "Repository access blocked".to_string(),
        }
    );
}

#[tokio::test]
async fn unexpected_listing_shape_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "widgets"})))
        .mount(&server)
        .await;

    let source = GitHubSource::new(&server.uri(), None).expect("source");
    let error = source
        .list_files(&repo(), &CancellationToken::new())
        .await
        .expect_err("should fail");

    assert!(matches!(error, SourceError::Malformed(_)), "{error:?}");
}

#[tokio::test]
async fn file_text_requests_raw_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/widgets/contents/src/lib.rs"))
        .and(header("accept", "application/vnd.github.v3.raw"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pub fn answer() -> u32 { 42 }\n"))
        .mount(&server)
        .await;

    let source = GitHubSource::new(&server.uri(), None).expect("source");
    let text = source
        .file_text(&repo(), "src/lib.rs", &CancellationToken::new())
        .await
        .expect("file text");

    assert_eq!(text, "pub fn answer() -> u32 { 42 }\n");
}

#[tokio::test]
async fn cancelled_token_short_circuits_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("late"))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let source = GitHubSource::new(&server.uri(), None).expect("source");
    let error = source
        .file_text(&repo(), "README.md", &cancel)
        .await
        .expect_err("should be cancelled");

    assert_eq!(error, SourceError::Cancelled);
}

#[tokio::test]
async fn slashed_default_branch_keeps_its_path_separators() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/widgets"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"default_branch": "release/1.0"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/widgets/git/trees/release/1.0"))
        .and(query_param("recursive", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tree": [{"path": "README.md", "type": "blob", "size": 5}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = GitHubSource::new(&server.uri(), None).expect("source");
    let files = source
        .list_files(&repo(), &CancellationToken::new())
        .await
        .expect("listing");

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, "README.md");
}
