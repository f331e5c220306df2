//! End-to-end tests of the tasklist HTTP API over a real TCP listener.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;
use std::sync::Arc;

use reqwest::StatusCode;
use tasklist_proto::task::{CreateTaskRequest, ErrorBody, Task, UpdateTaskRequest};
use tasklist_server::http::start_server;
use tasklist_server::service::TaskService;
use tasklist_server::store::FileStore;

/// Starts a server backed by `data_file` and returns its `/api/tasks` URL.
async fn spawn_server(data_file: &Path) -> (String, tokio::task::JoinHandle<()>) {
    let store = FileStore::open(data_file).unwrap();
    let service = Arc::new(TaskService::new(Arc::new(store)));
    let (addr, handle) = start_server("127.0.0.1:0", service, None).await.unwrap();
    (format!("http://{addr}/api/tasks"), handle)
}

async fn create(client: &reqwest::Client, base: &str, title: &str, description: Option<&str>) -> Task {
    let response = client
        .post(base)
        .json(&CreateTaskRequest {
            title: Some(title.to_string()),
            description: description.map(String::from),
        })
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn list(client: &reqwest::Client, base: &str) -> Vec<Task> {
    let response = client.get(base).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.json().await.unwrap()
}

#[tokio::test]
async fn buy_milk_walk_dog_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let (base, handle) = spawn_server(&dir.path().join("tasks.json")).await;
    let client = reqwest::Client::new();

    let milk = create(&client, &base, "Buy milk", None).await;
    assert!(!milk.completed);
    assert_eq!(milk.description, "");
    let dog = create(&client, &base, "Walk dog", Some("around the block")).await;
    assert_ne!(milk.id, dog.id);

    assert_eq!(list(&client, &base).await, vec![milk.clone(), dog.clone()]);

    let response = client
        .put(format!("{base}/{}", milk.id))
        .json(&UpdateTaskRequest {
            completed: Some(true),
            ..Default::default()
        })
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let done: Task = response.json().await.unwrap();
    assert!(done.completed);
    assert_eq!(done.title, "Buy milk");
    assert_eq!(done.created_at, milk.created_at);
    assert!(done.updated_at > milk.updated_at);

    let response = client.delete(format!("{base}/{}", dog.id)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let removed: Task = response.json().await.unwrap();
    assert_eq!(removed, dog);

    assert_eq!(list(&client, &base).await, vec![done]);

    handle.abort();
}

#[tokio::test]
async fn error_statuses_and_bodies() {
    let dir = tempfile::tempdir().unwrap();
    let (base, handle) = spawn_server(&dir.path().join("tasks.json")).await;
    let client = reqwest::Client::new();

    let response = client
        .post(&base)
        .json(&serde_json::json!({"description": "no title"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "Task title is required");

    let response = client
        .put(format!("{base}/missing"))
        .json(&serde_json::json!({"completed": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "Task not found");

    let response = client.delete(format!("{base}/missing")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let task = create(&client, &base, "keep", None).await;
    let response = client
        .put(format!("{base}/{}", task.id))
        .json(&serde_json::json!({"title": "   "}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "Task title cannot be empty");

    assert_eq!(list(&client, &base).await, vec![task]);

    handle.abort();
}

#[tokio::test]
async fn mutations_are_written_to_the_data_file() {
    let dir = tempfile::tempdir().unwrap();
    let data_file = dir.path().join("tasks.json");
    let (base, handle) = spawn_server(&data_file).await;
    let client = reqwest::Client::new();

    assert_eq!(std::fs::read_to_string(&data_file).unwrap(), "[]");

    let task = create(&client, &base, "persist me", None).await;
    let raw = std::fs::read_to_string(&data_file).unwrap();
    assert!(raw.starts_with("[\n  {"));
    assert!(raw.contains("\"createdAt\""));
    let on_disk: Vec<Task> = serde_json::from_str(&raw).unwrap();
    assert_eq!(on_disk, vec![task.clone()]);

    client.delete(format!("{base}/{}", task.id)).send().await.unwrap();
    assert_eq!(std::fs::read_to_string(&data_file).unwrap(), "[]");

    handle.abort();
}

#[tokio::test]
async fn concurrent_creates_are_all_kept() {
    let dir = tempfile::tempdir().unwrap();
    let (base, handle) = spawn_server(&dir.path().join("tasks.json")).await;
    let client = reqwest::Client::new();

    let mut joins = Vec::new();
    for i in 0..20 {
        let client = client.clone();
        let base = base.clone();
        joins.push(tokio::spawn(async move {
            create(&client, &base, &format!("task {i}"), None).await
        }));
    }
    for join in joins {
        join.await.unwrap();
    }

    assert_eq!(list(&client, &base).await.len(), 20);

    handle.abort();
}
