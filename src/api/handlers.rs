//! HTTP handlers for the todo endpoints.
//!
//! Handlers only translate between HTTP and `TodoService`: extractors have
//! already parsed the path id and validated the body by the time a handler
//! body runs.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use super::dto::{
    CreateTodoRequest, ListTodosQuery, SuccessResponse, TodoListResponse, TodoResponse,
    UpdateTodoRequest,
};
use super::error::ApiErrorResponse;
use super::extract::{TodoPath, ValidatedJson};
use crate::service::TodoService;

/// Success message for create.
pub const CREATED_MESSAGE: &str = "Todo successfully created";
/// Success message for update.
pub const UPDATED_MESSAGE: &str = "Todo successfully updated";
/// Success message for delete.
pub const DELETED_MESSAGE: &str = "Todo successfully deleted";
/// Success message for complete.
pub const COMPLETED_MESSAGE: &str = "Todo successfully completed";

// =============================================================================
// Application State
// =============================================================================

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub service: Arc<TodoService>,
}

impl AppState {
    /// Creates a new `AppState` around the service.
    #[must_use]
    pub fn new(service: TodoService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

type JsonResponse<T> = Json<SuccessResponse<T>>;

// =============================================================================
// Todo Handlers
// =============================================================================

/// POST /api/v1/todos
///
/// # Errors
///
/// 400 for an invalid body, 500 if the store fails.
pub async fn create_todo(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateTodoRequest>,
) -> Result<(StatusCode, JsonResponse<TodoResponse>), ApiErrorResponse> {
    let todo = state
        .service
        .create(request)
        .await
        .map_err(|error| ApiErrorResponse::from_service("Failed to create todo", &error))?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_message(CREATED_MESSAGE, todo)),
    ))
}

/// GET /api/v1/todos/{id}
///
/// # Errors
///
/// 400 for a non-numeric id, 404 for an unknown or deleted todo.
pub async fn get_todo(
    State(state): State<AppState>,
    TodoPath(id): TodoPath,
) -> Result<JsonResponse<TodoResponse>, ApiErrorResponse> {
    let todo = state
        .service
        .get_by_id(id)
        .await
        .map_err(|error| ApiErrorResponse::from_service("Failed to get todo", &error))?;

    Ok(Json(SuccessResponse::data(todo)))
}

/// GET /api/v1/todos?page=&size=&completed=
///
/// `page_size` is accepted as an alias of `size`.
///
/// # Errors
///
/// 400 for a non-boolean `completed` filter, 500 if the store fails.
pub async fn list_todos(
    State(state): State<AppState>,
    query: Result<Query<ListTodosQuery>, QueryRejection>,
) -> Result<JsonResponse<TodoListResponse>, ApiErrorResponse> {
    let Query(query) = query?;
    let completed = query
        .completed()
        .map_err(|error| ApiErrorResponse::invalid_query(error.to_string()))?;
    let (page, page_size) = (query.page(), query.page_size());

    let result = match completed {
        Some(completed) => {
            state
                .service
                .get_all_by_completed(completed, page, page_size)
                .await
        }
        None => state.service.get_all(page, page_size).await,
    };
    let todos =
        result.map_err(|error| ApiErrorResponse::from_service("Failed to list todos", &error))?;

    Ok(Json(SuccessResponse::data(todos)))
}

/// PUT /api/v1/todos/{id}
///
/// # Errors
///
/// 400 for a bad id or body, 404 for an unknown or deleted todo.
pub async fn update_todo(
    State(state): State<AppState>,
    TodoPath(id): TodoPath,
    ValidatedJson(request): ValidatedJson<UpdateTodoRequest>,
) -> Result<JsonResponse<TodoResponse>, ApiErrorResponse> {
    let todo = state
        .service
        .update(id, request)
        .await
        .map_err(|error| ApiErrorResponse::from_service("Failed to update todo", &error))?;

    Ok(Json(SuccessResponse::with_message(UPDATED_MESSAGE, todo)))
}

/// DELETE /api/v1/todos/{id}
///
/// # Errors
///
/// 400 for a non-numeric id, 404 for an unknown or already deleted todo.
pub async fn delete_todo(
    State(state): State<AppState>,
    TodoPath(id): TodoPath,
) -> Result<JsonResponse<()>, ApiErrorResponse> {
    state
        .service
        .delete(id)
        .await
        .map_err(|error| ApiErrorResponse::from_service("Failed to delete todo", &error))?;

    Ok(Json(SuccessResponse::message(DELETED_MESSAGE)))
}

/// PATCH /api/v1/todos/{id}/complete
///
/// # Errors
///
/// 400 for a non-numeric id, 404 for an unknown or deleted todo.
pub async fn complete_todo(
    State(state): State<AppState>,
    TodoPath(id): TodoPath,
) -> Result<JsonResponse<TodoResponse>, ApiErrorResponse> {
    let todo = state
        .service
        .complete(id)
        .await
        .map_err(|error| ApiErrorResponse::from_service("Failed to complete todo", &error))?;

    Ok(Json(SuccessResponse::with_message(COMPLETED_MESSAGE, todo)))
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /healthz
///
/// Liveness only; the store is not probed.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP".to_string(),
    })
}
