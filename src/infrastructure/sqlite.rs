//! `SQLite` repository implementation.
//!
//! Used for the embedded engine: in-memory databases in tests and local
//! development, or a single database file.
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE todos (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     title VARCHAR(255) NOT NULL,
//!     description TEXT NOT NULL DEFAULT '',
//!     completed BOOLEAN NOT NULL DEFAULT FALSE,
//!     priority VARCHAR(20) NOT NULL DEFAULT 'medium',
//!     due_date DATETIME,
//!     created_at DATETIME NOT NULL,
//!     updated_at DATETIME NOT NULL,
//!     deleted_at DATETIME
//! );
//! CREATE INDEX idx_todos_deleted_at ON todos(deleted_at);
//! ```

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::{NewTodo, Todo, TodoId};
use crate::infrastructure::repository::{
    TodoRecord, count_to_total, current_timestamp, records_into_todos, refreshed_timestamp,
    storable,
};
use crate::infrastructure::{PaginatedResult, Pagination, RepositoryError, TodoRepository};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS todos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title VARCHAR(255) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    completed BOOLEAN NOT NULL DEFAULT FALSE,
    priority VARCHAR(20) NOT NULL DEFAULT 'medium',
    due_date DATETIME,
    created_at DATETIME NOT NULL,
    updated_at DATETIME NOT NULL,
    deleted_at DATETIME
)";

const CREATE_DELETED_AT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_todos_deleted_at ON todos(deleted_at)";

/// `SQLite` implementation of `TodoRepository`.
#[derive(Debug, Clone)]
pub struct SqliteTodoRepository {
    pool: SqlitePool,
}

impl SqliteTodoRepository {
    /// Creates a repository over an existing pool.
    ///
    /// The schema is not touched; call [`Self::ensure_schema`] first on a
    /// fresh database.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the underlying connection pool.
    ///
    /// Tests use it to inspect rows that the repository itself hides, such as
    /// soft-deleted ones.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
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
impl TodoRepository for SqliteTodoRepository {
    async fn create(&self, todo: NewTodo) -> Result<Todo, RepositoryError> {
        let now = current_timestamp();
        let due_date = todo.due_date.map(storable);

        let result = sqlx::query(
            "INSERT INTO todos \
             (title, description, completed, priority, due_date, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.completed)
        .bind(todo.priority.as_str())
        .bind(due_date)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = u64::try_from(result.last_insert_rowid()).map_err(|_| {
            RepositoryError::Corrupt(format!(
                "negative rowid {}",
                result.last_insert_rowid()
            ))
        })?;

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
             FROM todos WHERE id = ? AND deleted_at IS NULL",
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
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
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
            "SELECT COUNT(*) FROM todos WHERE completed = ? AND deleted_at IS NULL",
        )
        .bind(completed)
        .fetch_one(&self.pool)
        .await?;

        let records: Vec<TodoRecord> = sqlx::query_as(
            "SELECT id, title, description, completed, priority, due_date, \
             created_at, updated_at, deleted_at \
             FROM todos WHERE completed = ? AND deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
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
            "UPDATE todos SET title = ?, description = ?, completed = ?, priority = ?, \
             due_date = ?, updated_at = ? \
             WHERE id = ? AND deleted_at IS NULL",
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
            sqlx::query("UPDATE todos SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
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

// =============================================================================
// Tests
// =============================================================================
