//! API module for HTTP handlers.
//!
//! This module contains route definitions, extractors and request/response
//! types.

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;

pub use dto::{
    CreateTodoRequest, ListTodosQuery, SuccessResponse, TodoListResponse, TodoResponse,
    UpdateTodoRequest,
};
pub use error::{ApiErrorResponse, ErrorResponse};
pub use extract::{TodoPath, ValidatedJson};
pub use handlers::{
    AppState, HealthResponse, complete_todo, create_todo, delete_todo, get_todo, health_check,
    list_todos, update_todo,
};
pub use router::{API_PREFIX, create_router};
