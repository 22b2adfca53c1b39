//! Common test helpers for integration tests.
//!
//! Each test gets its own router over a private in-memory `SQLite`
//! database, plus the raw pool for checks the API cannot express.
//!
//! # Note
//!
//! `#![allow(dead_code)]` is needed because every integration test file is
//! its own crate and not every file uses every helper.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tower::ServiceExt;

use todo_api::api::{AppState, create_router};
use todo_api::infrastructure::RepositoryFactory;
use todo_api::service::TodoService;

/// Router plus direct access to its database.
pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
}

/// Builds the full application over a fresh in-memory database.
pub async fn spawn_app() -> TestApp {
    let repository = RepositoryFactory::create_sqlite_in_memory()
        .await
        .expect("in-memory database should open");
    let pool = repository.pool().clone();

    let service = TodoService::new(Arc::new(repository));
    let router = create_router(AppState::new(service));

    TestApp { router, pool }
}

impl TestApp {
    /// Sends one request and returns the status and parsed JSON body.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        self.send(request).await
    }

    /// Sends a prepared request and returns the status and parsed JSON body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should be readable")
            .to_bytes();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be JSON")
        };

        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    pub async fn patch(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, None).await
    }

    /// Creates a todo through the API and returns its id.
    pub async fn create_todo(&self, title: &str) -> u64 {
        self.create_todo_with(json!({ "title": title })).await
    }

    /// Creates a todo from an arbitrary body and returns its id.
    pub async fn create_todo_with(&self, body: Value) -> u64 {
        let (status, response) = self.post("/api/v1/todos", body).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {response}");
        response["data"]["id"].as_u64().expect("created todo has an id")
    }

    /// Counts rows in the table, soft-deleted ones included.
    pub async fn stored_row_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM todos")
            .fetch_one(&self.pool)
            .await
            .expect("count query should succeed")
    }
}
