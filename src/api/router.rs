//! Route table and middleware stack.

use axum::{
    Router,
    routing::{get, patch},
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, complete_todo, create_todo, delete_todo, get_todo, health_check, list_todos,
    update_todo,
};

/// Version prefix of the todo endpoints.
pub const API_PREFIX: &str = "/api/v1";

/// Builds the application router with tracing and CORS applied.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let todos = Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .route("/todos/{id}/complete", patch(complete_todo));

    Router::new()
        .route("/healthz", get(health_check))
        .nest(API_PREFIX, todos)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
