//! HTTP surface: the `/api/tasks` routes, error mapping, CORS, and optional
//! static hosting of the browser client.

use std::path::Path;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use tasklist_proto::task::{CreateTaskRequest, ErrorBody, Task, TaskId, UpdateTaskRequest};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::service::{TaskError, TaskService};

/// Which endpoint an error came from; selects the response message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    List,
    Create,
    Update,
    Delete,
}

impl Operation {
    const fn failure_message(self) -> &'static str {
        match self {
            Self::List => "Failed to retrieve tasks",
            Self::Create => "Failed to create task",
            Self::Update => "Failed to update task",
            Self::Delete => "Failed to delete task",
        }
    }

    const fn invalid_title_message(self) -> &'static str {
        match self {
            Self::Create => "Task title is required",
            _ => "Task title cannot be empty",
        }
    }
}

/// An error response: status code plus a short client-facing message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    const fn new(status: StatusCode, message: &'static str) -> Self {
        Self { status, message }
    }

    const fn internal(op: Operation) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, op.failure_message())
    }

    const fn bad_body() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Invalid request body")
    }

    fn from_task_error(op: Operation, err: TaskError) -> Self {
        match err {
            TaskError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, op.invalid_title_message()),
            TaskError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Task not found"),
            TaskError::Storage(e) => {
                tracing::error!(op = ?op, error = %e, "storage failure");
                Self::internal(op)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody::new(self.message))).into_response()
    }
}

/// Builds the application router.
///
/// When `static_dir` is given, any path not matched by the API is served
/// from that directory.
pub fn router(service: Arc<TaskService>, static_dir: Option<&Path>) -> Router {
    let api = Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", put(update_task).delete(delete_task))
        .with_state(service);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)).layer(cors),
        None => api.layer(cors),
    }
}

/// Starts the server on `addr` and returns the bound address and a join handle.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
    service: Arc<TaskService>,
    static_dir: Option<&Path>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(service, static_dir);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "http server error");
        }
    });

    Ok((bound_addr, handle))
}

/// Runs a service call on the blocking pool; the store does synchronous I/O.
async fn run_blocking<T, F>(service: Arc<TaskService>, op: Operation, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&TaskService) -> Result<T, TaskError> + Send + 'static,
{
    match tokio::task::spawn_blocking(move || f(&service)).await {
        Ok(result) => result.map_err(|e| ApiError::from_task_error(op, e)),
        Err(e) => {
            tracing::error!(op = ?op, error = %e, "task operation aborted");
            Err(ApiError::internal(op))
        }
    }
}

/// Unwraps a JSON body. A request without a JSON content type counts as `{}`.
fn body<T: Default>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(e) => {
            tracing::debug!(error = %e, "rejected request body");
            Err(ApiError::bad_body())
        }
    }
}

async fn list_tasks(State(service): State<Arc<TaskService>>) -> Result<Json<Vec<Task>>, ApiError> {
    run_blocking(service, Operation::List, TaskService::list)
        .await
        .map(Json)
}

async fn create_task(
    State(service): State<Arc<TaskService>>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let request = body(payload)?;
    let task = run_blocking(service, Operation::Create, move |svc| svc.create(request)).await?;
    tracing::info!(task_id = %task.id, "created task");
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(service): State<Arc<TaskService>>,
    UrlPath(id): UrlPath<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let request = body(payload)?;
    let id = TaskId::from(id);
    run_blocking(service, Operation::Update, move |svc| svc.update(&id, request))
        .await
        .map(Json)
}

async fn delete_task(
    State(service): State<Arc<TaskService>>,
    UrlPath(id): UrlPath<String>,
) -> Result<Json<Task>, ApiError> {
    let id = TaskId::from(id);
    let task = run_blocking(service, Operation::Delete, move |svc| svc.delete(&id)).await?;
    tracing::info!(task_id = %task.id, "deleted task");
    Ok(Json(task))
}
