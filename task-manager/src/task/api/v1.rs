use crate::context::RequestContext;
use crate::task::service::TaskService;
use crate::task::{CreateTaskInput, Task, TaskError, TaskStatus, UpdateTaskInput};
use crate::web::api::ServerErrorResponse;
use axum::{
    Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

/// Shared state for the task endpoints.
#[derive(Clone)]
pub struct TaskState {
    pub service: TaskService,
    pub request_timeout: Duration,
}

impl TaskState {
    fn request_context(&self) -> RequestContext {
        RequestContext::with_timeout(self.request_timeout)
    }
}

/// JSON representation of a Task for API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TaskJson {
    /// Unique identifier of the task
    pub id: Uuid,
    /// Title of the task
    pub title: String,
    /// Description, possibly empty
    pub description: String,
    /// Current status
    pub status: TaskStatus,
    /// Due date, omitted when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Time of the last successful update
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            due_date: task.due_date,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Error type for task endpoint failures, rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid task ID")]
    InvalidId,
    #[error("{0}")]
    InvalidBody(String),
    #[error("Task not found")]
    NotFound,
    /// The message is what the caller sees; the cause has already been logged.
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    /// Maps a service error, logging anything that is not a caller problem.
    fn from_service(err: TaskError, failure_message: &'static str) -> Self {
        match err {
            TaskError::NotFound(_) => ApiError::NotFound,
            err => {
                tracing::error!("{}: {}", failure_message, err);
                ApiError::Internal(failure_message)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = match &self {
            ApiError::InvalidId | ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status_code, Json(ServerErrorResponse::new(self.to_string()))).into_response()
    }
}

fn parse_task_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::InvalidId)
}

/// Handler for GET /api/v1/tasks - Returns all tasks, newest first.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    responses(
        (status = 200, description = "Successfully retrieved tasks", body = [TaskJson]),
        (status = 500, description = "Internal server error", body = ServerErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn list_tasks_handler(
    State(state): State<Arc<TaskState>>,
) -> Result<Json<Vec<TaskJson>>, ApiError> {
    let context = state.request_context();
    let tasks = state
        .service
        .list_tasks(&context)
        .await
        .map_err(|err| ApiError::from_service(err, "Failed to list tasks"))?;

    Ok(Json(tasks.into_iter().map(TaskJson::from).collect()))
}

/// Handler for POST /api/v1/tasks - Creates a task.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    request_body = CreateTaskInput,
    responses(
        (status = 201, description = "Task created", body = TaskJson),
        (status = 400, description = "Malformed body or missing title", body = ServerErrorResponse),
        (status = 500, description = "Internal server error", body = ServerErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    payload: Result<Json<CreateTaskInput>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskJson>), ApiError> {
    let Json(input) = payload?;
    if input.title.is_empty() {
        return Err(ApiError::InvalidBody("title is required".to_string()));
    }

    let context = state.request_context();
    let task = state
        .service
        .create_task(&context, input)
        .await
        .map_err(|err| ApiError::from_service(err, "Failed to create task"))?;

    Ok((StatusCode::CREATED, Json(TaskJson::from(task))))
}

/// Handler for GET /api/v1/tasks/{id} - Returns a single task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    params(
        ("id" = String, Path, description = "UUID of the task")
    ),
    responses(
        (status = 200, description = "Task found", body = TaskJson),
        (status = 400, description = "Malformed task ID", body = ServerErrorResponse),
        (status = 404, description = "Task not found", body = ServerErrorResponse),
        (status = 500, description = "Internal server error", body = ServerErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<String>,
) -> Result<Json<TaskJson>, ApiError> {
    let id = parse_task_id(&id)?;

    let context = state.request_context();
    let task = state
        .service
        .get_task(&context, id)
        .await
        .map_err(|err| ApiError::from_service(err, "Failed to get task"))?;

    Ok(Json(TaskJson::from(task)))
}

/// Handler for PUT /api/v1/tasks/{id} - Applies a partial update.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}",
    params(
        ("id" = String, Path, description = "UUID of the task")
    ),
    request_body = UpdateTaskInput,
    responses(
        (status = 200, description = "Task updated", body = TaskJson),
        (status = 400, description = "Malformed task ID or body", body = ServerErrorResponse),
        (status = 404, description = "Task not found", body = ServerErrorResponse),
        (status = 500, description = "Internal server error", body = ServerErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskInput>, JsonRejection>,
) -> Result<Json<TaskJson>, ApiError> {
    let id = parse_task_id(&id)?;
    let Json(input) = payload?;

    let context = state.request_context();
    let task = state
        .service
        .update_task(&context, id, input)
        .await
        .map_err(|err| ApiError::from_service(err, "Failed to update task"))?;

    Ok(Json(TaskJson::from(task)))
}

/// Handler for DELETE /api/v1/tasks/{id} - Removes a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    params(
        ("id" = String, Path, description = "UUID of the task")
    ),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 400, description = "Malformed task ID", body = ServerErrorResponse),
        (status = 404, description = "Task not found", body = ServerErrorResponse),
        (status = 500, description = "Internal server error", body = ServerErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_task_id(&id)?;

    let context = state.request_context();
    state
        .service
        .delete_task(&context, id)
        .await
        .map_err(|err| ApiError::from_service(err, "Failed to delete task"))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Creates and returns the tasks API router.
pub fn create_api_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks_handler).post(create_task_handler))
        .route(
            "/tasks/{id}",
            get(get_task_handler)
                .put(update_task_handler)
                .delete(delete_task_handler),
        )
        .with_state(state)
}
