use std::sync::Arc;

use crate::task::TaskStatus;
use crate::task::api::v1::{TaskJson, TaskState};
use crate::task::{CreateTaskInput, UpdateTaskInput};

use axum::Router;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// JSON body of every failed API request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ServerErrorResponse {
    /// Human readable description of what went wrong
    pub error: String,
}

impl ServerErrorResponse {
    pub fn new(error: String) -> Self {
        Self { error }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::task::api::v1::list_tasks_handler,
        crate::task::api::v1::create_task_handler,
        crate::task::api::v1::get_task_handler,
        crate::task::api::v1::update_task_handler,
        crate::task::api::v1::delete_task_handler,
    ),
    components(schemas(
        TaskJson,
        TaskStatus,
        CreateTaskInput,
        UpdateTaskInput,
        ServerErrorResponse
    )),
    tags((name = "Tasks", description = "Task management endpoints"))
)]
pub struct ApiDoc;

/// Creates the API routes for JSON API endpoints, together with their OpenAPI document.
pub fn create_api_router(task_state: Arc<TaskState>) -> Router {
    let tasks_router = crate::task::api::v1::create_api_router(task_state);
    Router::new()
        .nest("/api/v1", tasks_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_document_every_task_route() {
        let document = ApiDoc::openapi();

        assert!(document.paths.paths.contains_key("/api/v1/tasks"));
        assert!(document.paths.paths.contains_key("/api/v1/tasks/{id}"));
    }

    #[test]
    fn can_serialize_error_response() {
        let response = ServerErrorResponse::new("Task not found".to_string());

        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"error":"Task not found"}"#
        );
    }
}
