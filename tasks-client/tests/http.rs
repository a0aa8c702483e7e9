#![expect(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use taskboard_backend_client::ApiError;
use taskboard_backend_client::Client;
use taskboard_login::MemoryTokenStore;
use taskboard_login::TokenPair;
use taskboard_login::TokenStore;
use taskboard_tasks_client::HttpTaskClient;
use taskboard_tasks_client::NewTask;
use taskboard_tasks_client::TaskBackend;
use taskboard_tasks_client::TaskError;
use taskboard_tasks_client::TaskId;
use taskboard_tasks_client::TaskPriority;
use taskboard_tasks_client::TaskStatus;
use taskboard_tasks_client::TaskUpdate;
use taskboard_tasks_client::WireFormat;
use taskboard_tasks_client::parse_datetime;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_json;
use wiremock::matchers::header;
use wiremock::matchers::method;
use wiremock::matchers::path;

async fn tasks_client(wire: WireFormat) -> (MockServer, Arc<MemoryTokenStore>, HttpTaskClient) {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryTokenStore::with_tokens(
        "alice",
        TokenPair::new("A1", "R1"),
    ));
    let backend = Client::new(server.uri(), store.clone()).expect("client");
    let client = HttpTaskClient::new(backend).with_wire_format(wire);
    (server, store, client)
}

#[tokio::test]
async fn lists_django_tasks() {
    let (server, _store, client) = tasks_client(WireFormat::Django).await;
    Mock::given(method("GET"))
        .and(path("/todo/todos/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "Write report", "status": "PENDING", "priority": "HIGH",
             "due_date": "2025-03-01"},
            {"id": 2, "title": "Call supplier", "status": "COMPLETED", "priority": "LOW"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let tasks = client.list_tasks().await.expect("list");

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id, TaskId::from("1"));
    assert_eq!(tasks[0].priority, TaskPriority::High);
    assert_eq!(tasks[0].deadline, parse_datetime("2025-03-01"));
    assert_eq!(tasks[1].status, TaskStatus::Completed);
    assert_eq!(tasks[1].deadline, None);
}

#[tokio::test]
async fn lists_paginated_employee_tasks() {
    let (server, _store, client) = tasks_client(WireFormat::Employee).await;
    Mock::given(method("GET"))
        .and(path("/todo/todos/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "next": null,
            "results": [{
                "id": "7",
                "task_name": "Inventory",
                "task_status": "IN_PROGRESS",
                "task_priority": "MEDIUM",
                "deadline": "2025-04-10T09:00:00Z",
                "employee_info": {"id": 3, "full_name": "Petrov P."}
            }]
        })))
        .mount(&server)
        .await;

    let tasks = client.list_tasks().await.expect("list");

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Inventory");
    assert_eq!(tasks[0].status, TaskStatus::InProgress);
    assert_eq!(tasks[0].assignee.as_deref(), Some("Petrov P."));
}

#[tokio::test]
async fn creates_task_in_backend_shape() {
    let (server, _store, client) = tasks_client(WireFormat::Employee).await;
    Mock::given(method("POST"))
        .and(path("/todo/todos/"))
        .and(body_json(json!({
            "task_name": "Inventory",
            "description": "count the shelves",
            "task_status": "PENDING",
            "task_priority": "HIGH"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 11,
            "task_name": "Inventory",
            "description": "count the shelves",
            "task_status": "PENDING",
            "task_priority": "HIGH"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client
        .create_task(NewTask {
            title: "Inventory".to_string(),
            description: "count the shelves".to_string(),
            priority: TaskPriority::High,
            ..NewTask::default()
        })
        .await
        .expect("create");

    assert_eq!(created.id, TaskId::from("11"));
    assert_eq!(created.priority, TaskPriority::High);
}

#[tokio::test]
async fn status_update_patches_only_status() {
    let (server, _store, client) = tasks_client(WireFormat::Django).await;
    Mock::given(method("PATCH"))
        .and(path("/todo/todos/5/"))
        .and(body_json(json!({"status": "IN_PROGRESS"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5, "title": "Refactor", "status": "IN_PROGRESS", "priority": "LOW"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let updated = client
        .set_status(&TaskId::from("5"), TaskStatus::InProgress)
        .await
        .expect("update");

    assert_eq!(updated.status, TaskStatus::InProgress);
    assert_eq!(updated.title, "Refactor");
}

#[tokio::test]
async fn update_with_empty_body_is_reported() {
    let (server, _store, client) = tasks_client(WireFormat::Django).await;
    Mock::given(method("PATCH"))
        .and(path("/todo/todos/5/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let err = client
        .update_task(
            &TaskId::from("5"),
            TaskUpdate {
                title: Some("Renamed".to_string()),
                ..TaskUpdate::default()
            },
        )
        .await
        .expect_err("no body");

    assert!(matches!(err, TaskError::EmptyResponse(ref e) if e == "/todo/todos/5/"));
}

#[tokio::test]
async fn delete_and_mark_completed_hit_task_endpoints() {
    let (server, _store, client) = tasks_client(WireFormat::Django).await;
    Mock::given(method("DELETE"))
        .and(path("/todo/todos/3/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/todo/todos/4/mark_as_completed/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_task(&TaskId::from("3")).await.expect("delete");
    client
        .mark_completed(&TaskId::from("4"))
        .await
        .expect("complete");
}

#[tokio::test]
async fn missing_task_surfaces_not_found_endpoint() {
    let (server, _store, client) = tasks_client(WireFormat::Django).await;
    Mock::given(method("DELETE"))
        .and(path("/todo/todos/99/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client
        .delete_task(&TaskId::from("99"))
        .await
        .expect_err("404");

    assert!(matches!(
        err,
        TaskError::Api(ApiError::NotFound { ref endpoint }) if endpoint == "/todo/todos/99/"
    ));
}

#[tokio::test]
async fn failed_refresh_propagates_as_auth_error() {
    let (server, store, client) = tasks_client(WireFormat::Django).await;
    Mock::given(method("GET"))
        .and(path("/todo/todos/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Token is invalid or expired"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.list_tasks().await.expect_err("session expired");

    assert!(err.is_auth_error());
    assert_eq!(store.access_token(), None);
}

#[tokio::test]
async fn unexpected_list_shape_is_a_wire_error() {
    let (server, _store, client) = tasks_client(WireFormat::Table).await;
    Mock::given(method("GET"))
        .and(path("/todo/todos/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tasks": []})))
        .mount(&server)
        .await;

    let err = client.list_tasks().await.expect_err("bad shape");

    assert!(matches!(err, TaskError::Wire(_)));
}

#[tokio::test]
async fn mark_completed_accepts_empty_success_body() {
    let (server, _store, client) = tasks_client(WireFormat::Django).await;
    Mock::given(method("POST"))
        .and(path("/todo/todos/4/mark_as_completed/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client
        .mark_completed(&TaskId::from("4"))
        .await
        .expect("empty 200 is a success");
}

#[tokio::test]
async fn path_escaping_id_is_rejected_before_sending() {
    let (server, _store, client) = tasks_client(WireFormat::Django).await;

    let err = client
        .delete_task(&TaskId::from("../../auth/logout"))
        .await
        .expect_err("invalid id");

    assert!(matches!(err, TaskError::InvalidId(_)));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
