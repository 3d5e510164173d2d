//! End-to-end sync runs against a mock YouTrack and an on-disk task database.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use tempfile::TempDir;
use tracksync_core::SyncError;
use tracksync_services::{
    run_sync, ClientSettings, NewTask, SyncOptions, SyncRequest, TaskRepository,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SPRINT_PATH: &str = "/api/agiles/108-4/sprints/109-7/issues";

fn api_issue(id: &str, state: &str) -> serde_json::Value {
    serde_json::json!({
        "idReadable": id,
        "summary": format!("Summary of {id}"),
        "description": format!("Details of {id}"),
        "customFields": [
            {"name": "State", "value": {"name": state}}
        ]
    })
}

async fn mock_board(token: &str) -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SPRINT_PATH))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .and(query_param("$skip", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            api_issue("PRJ-1", "Open"),
            api_issue("PRJ-2", "In Progress"),
            api_issue("PRJ-3", "Open"),
            api_issue("PRJ-4", "open"),
            api_issue("PRJ-5", "Open"),
        ])))
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(SPRINT_PATH))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .with_priority(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(SPRINT_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    mock_server
}

fn request_for(server: &MockServer, token: &str) -> SyncRequest {
    SyncRequest::new(
        "proj-1",
        format!("{}/agiles/108-4/109-7", server.uri()),
        token,
    )
}

fn open_repo(dir: &TempDir) -> TaskRepository {
    TaskRepository::open_sqlite(&dir.path().join("tasks.db")).unwrap()
}

#[tokio::test]
async fn test_sync_creates_tasks_for_open_issues() {
    let server = mock_board("perm:abc").await;
    let dir = TempDir::new().unwrap();
    let tasks = open_repo(&dir);

    let result = run_sync(
        &request_for(&server, "perm:abc"),
        &tasks,
        &ClientSettings::default(),
        &SyncOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.open_issues_total, 3);
    assert_eq!(result.created, 3);
    assert_eq!(result.skipped_existing, 0);
    assert_eq!(
        result.created_titles,
        vec!["Summary of PRJ-1", "Summary of PRJ-3", "Summary of PRJ-5"]
    );

    let stored = tasks.list_for_project("proj-1").await.unwrap();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[0].source_issue_id.as_deref(), Some("PRJ-1"));
    let description = stored[0].description.as_deref().unwrap();
    assert!(description.starts_with("YouTrack: "));
    assert!(description.ends_with("Details of PRJ-1"));
}

#[tokio::test]
async fn test_rerun_after_reopen_creates_nothing() {
    let server = mock_board("perm:abc").await;
    let dir = TempDir::new().unwrap();
    let request = request_for(&server, "perm:abc");

    {
        let tasks = open_repo(&dir);
        run_sync(&request, &tasks, &ClientSettings::default(), &SyncOptions::default())
            .await
            .unwrap();
    }

    let tasks = open_repo(&dir);
    let result = run_sync(&request, &tasks, &ClientSettings::default(), &SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(result.created, 0);
    assert_eq!(result.skipped_existing, 3);
    assert_eq!(tasks.count_for_project("proj-1").await.unwrap(), 3);
}

#[tokio::test]
async fn test_dry_run_reports_without_writing() {
    let server = mock_board("perm:abc").await;
    let dir = TempDir::new().unwrap();
    let tasks = open_repo(&dir);
    tasks
        .create(NewTask {
            source_issue_id: Some("PRJ-3".to_string()),
            ..NewTask::new("proj-1", "Summary of PRJ-3")
        })
        .await
        .unwrap();

    let mut request = request_for(&server, "perm:abc");
    request.dry_run = true;
    let result = run_sync(&request, &tasks, &ClientSettings::default(), &SyncOptions::default())
        .await
        .unwrap();

    assert!(result.dry_run);
    assert_eq!(result.open_issues_total, 3);
    assert_eq!(result.created, 2);
    assert_eq!(result.skipped_existing, 1);
    assert_eq!(tasks.count_for_project("proj-1").await.unwrap(), 1);
}

#[tokio::test]
async fn test_rejected_token_returns_error_and_writes_nothing() {
    let server = mock_board("perm:abc").await;
    let dir = TempDir::new().unwrap();
    let tasks = open_repo(&dir);

    let result = run_sync(
        &request_for(&server, "perm:wrong"),
        &tasks,
        &ClientSettings::default(),
        &SyncOptions::default(),
    )
    .await;

    assert!(matches!(result, Err(SyncError::AuthenticationFailed(_))));
    assert_eq!(tasks.count_for_project("proj-1").await.unwrap(), 0);
}

#[tokio::test]
async fn test_empty_token_never_reaches_tracker() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;
    let dir = TempDir::new().unwrap();
    let tasks = open_repo(&dir);

    let result = run_sync(
        &request_for(&mock_server, ""),
        &tasks,
        &ClientSettings::default(),
        &SyncOptions::default(),
    )
    .await;

    assert_eq!(result, Err(SyncError::MissingCredential));
}
