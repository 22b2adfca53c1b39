//! `PostgreSQL` repository implementation.
//!
//! This module provides the production implementation of [`TodoRepository`]
//! using `sqlx` for database operations.
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE todos (
//!     id BIGSERIAL PRIMARY KEY,
//!     title VARCHAR(255) NOT NULL,
//!     description TEXT NOT NULL DEFAULT '',
//!     completed BOOLEAN NOT NULL DEFAULT FALSE,
//!     priority VARCHAR(20) NOT NULL DEFAULT 'medium',
//!     due_date TIMESTAMPTZ,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL,
//!     deleted_at TIMESTAMPTZ
//! );
//! CREATE INDEX idx_todos_deleted_at ON todos(deleted_at);
//! ```

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{NewTodo, Todo, TodoId};
use crate::infrastructure::repository::{
    TodoRecord, count_to_total, current_timestamp, records_into_todos, refreshed_timestamp,
    storable,
};
use crate::infrastructure::{PaginatedResult, Pagination, RepositoryError, TodoRepository};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS todos (
    id BIGSERIAL PRIMARY KEY,
    title VARCHAR(255) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    completed BOOLEAN NOT NULL DEFAULT FALSE,
    priority VARCHAR(20) NOT NULL DEFAULT 'medium',
    due_date TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    deleted_at TIMESTAMPTZ
)";

const CREATE_DELETED_AT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_todos_deleted_at ON todos(deleted_at)";

/// `PostgreSQL` implementation of `TodoRepository`.
///
/// Uses a connection pool; clones share the pool.
///
/// # Example
///
/// ```ignore
/// let pool = PgPool::connect("postgres://localhost/todoapp").await?;
/// let repository = PostgresTodoRepository::new(pool);
/// repository.ensure_schema().await?;
///
/// let todo = repository.create(NewTodo::new("Buy milk")).await?;
/// let found = repository.find_by_id(todo.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PostgresTodoRepository {
    /// Connection pool for `PostgreSQL`.
    pool: PgPool,
}

impl PostgresTodoRepository {
    /// Creates a new `PostgreSQL` todo repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the `todos` table and its index if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a DDL statement fails.
    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_DELETED_AT_INDEX)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TodoRepository for PostgresTodoRepository {
    async fn create(&self, todo: NewTodo) -> Result<Todo, RepositoryError> {
        let now = current_timestamp();
        let due_date = todo.due_date.map(storable);

        let raw_id: i64 = sqlx::query_scalar(
            "INSERT INTO todos \
             (title, description, completed, priority, due_date, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.completed)
        .bind(todo.priority.as_str())
        .bind(due_date)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        let id = u64::try_from(raw_id)
            .map_err(|_| RepositoryError::Corrupt(format!("negative id {raw_id}")))?;

        tracing::debug!(todo_id = id, "Inserted todo");

        Ok(Todo {
            id: TodoId::new(id),
            title: todo.title,
            description: todo.description,
            completed: todo.completed,
            priority: todo.priority,
            due_date,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    async fn find_by_id(&self, id: TodoId) -> Result<Todo, RepositoryError> {
        let Some(raw_id) = id.to_database() else {
            return Err(RepositoryError::todo_not_found(id));
        };

        let record: Option<TodoRecord> = sqlx::query_as(
            "SELECT id, title, description, completed, priority, due_date, \
             created_at, updated_at, deleted_at \
             FROM todos WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(raw_id)
        .fetch_optional(&self.pool)
        .await?;

        record.map_or_else(
            || Err(RepositoryError::todo_not_found(id)),
            Todo::try_from,
        )
    }

    async fn list(&self, pagination: Pagination) -> Result<PaginatedResult<Todo>, RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todos WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;

        let records: Vec<TodoRecord> = sqlx::query_as(
            "SELECT id, title, description, completed, priority, due_date, \
             created_at, updated_at, deleted_at \
             FROM todos WHERE deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
        )
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(PaginatedResult::new(
            records_into_todos(records)?,
            count_to_total(total),
        ))
    }

    async fn list_by_completed(
        &self,
        completed: bool,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Todo>, RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM todos WHERE completed = $1 AND deleted_at IS NULL",
        )
        .bind(completed)
        .fetch_one(&self.pool)
        .await?;

        let records: Vec<TodoRecord> = sqlx::query_as(
            "SELECT id, title, description, completed, priority, due_date, \
             created_at, updated_at, deleted_at \
             FROM todos WHERE completed = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(completed)
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(PaginatedResult::new(
            records_into_todos(records)?,
            count_to_total(total),
        ))
    }

    async fn update(&self, todo: Todo) -> Result<Todo, RepositoryError> {
        let Some(raw_id) = todo.id.to_database() else {
            return Err(RepositoryError::todo_not_found(todo.id));
        };
        let updated_at = refreshed_timestamp(todo.created_at);
        let due_date = todo.due_date.map(storable);

        let result = sqlx::query(
            "UPDATE todos SET title = $1, description = $2, completed = $3, priority = $4, \
             due_date = $5, updated_at = $6 \
             WHERE id = $7 AND deleted_at IS NULL",
        )
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.completed)
        .bind(todo.priority.as_str())
        .bind(due_date)
        .bind(updated_at)
        .bind(raw_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::todo_not_found(todo.id));
        }

        Ok(Todo {
            due_date,
            updated_at,
            ..todo
        })
    }

    async fn delete(&self, id: TodoId) -> Result<(), RepositoryError> {
        let Some(raw_id) = id.to_database() else {
            return Err(RepositoryError::todo_not_found(id));
        };

        let result =
            sqlx::query("UPDATE todos SET deleted_at = $1 WHERE id = $2 AND deleted_at IS NULL")
                .bind(current_timestamp())
                .bind(raw_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::todo_not_found(id));
        }

        tracing::debug!(todo_id = %id, "Soft-deleted todo");
        Ok(())
    }
}
