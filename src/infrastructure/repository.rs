//! Repository trait for the todo entity.
//!
//! Implementations must apply the active-record predicate
//! (`deleted_at IS NULL`) in every statement they issue, so that soft-deleted
//! rows behave exactly like rows that never existed.

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error;

use crate::domain::{NewTodo, Todo, TodoId};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// No active record matched.
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// The store rejected the statement or could not be reached.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored row could not be converted into a domain value.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl RepositoryError {
    /// Creates a `NotFound` error for a todo identifier.
    #[must_use]
    pub fn todo_not_found(id: TodoId) -> Self {
        Self::NotFound(format!("todo {id}"))
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => Self::NotFound("row not found".to_string()),
            other => Self::Database(other.to_string()),
        }
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Limit/offset window for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Maximum number of rows to return.
    pub limit: i64,
    /// Number of rows to skip.
    pub offset: i64,
}

impl Pagination {
    /// Creates a new pagination window.
    #[must_use]
    pub const fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }

    /// Creates the window for a 1-indexed page.
    ///
    /// Callers are expected to pass normalized values (`page >= 1`,
    /// `page_size >= 1`). The offset saturates instead of overflowing.
    #[must_use]
    pub const fn for_page(page: i64, page_size: i64) -> Self {
        Self {
            limit: page_size,
            offset: (page - 1).saturating_mul(page_size),
        }
    }
}

/// One page of rows plus the total number of matching active rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatedResult<T> {
    /// The rows in the requested window.
    pub items: Vec<T>,
    /// Count of all matching rows, independent of the window.
    pub total: u64,
}

impl<T> PaginatedResult<T> {
    /// Creates a new paginated result.
    #[must_use]
    pub const fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Raw `todos` row as read by either backend.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TodoRecord {
    id: i64,
    title: String,
    description: String,
    completed: bool,
    priority: String,
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<TodoRecord> for Todo {
    type Error = RepositoryError;

    fn try_from(record: TodoRecord) -> Result<Self, Self::Error> {
        let id = u64::try_from(record.id)
            .map_err(|_| RepositoryError::Corrupt(format!("negative id {}", record.id)))?;
        let priority = record
            .priority
            .parse()
            .map_err(|error| RepositoryError::Corrupt(format!("todo {id}: {error}")))?;

        Ok(Self {
            id: TodoId::new(id),
            title: record.title,
            description: record.description,
            completed: record.completed,
            priority,
            due_date: record.due_date,
            created_at: record.created_at,
            updated_at: record.updated_at,
            deleted_at: record.deleted_at,
        })
    }
}

/// Converts fetched rows into domain values, failing on the first bad row.
pub(crate) fn records_into_todos(records: Vec<TodoRecord>) -> Result<Vec<Todo>, RepositoryError> {
    records.into_iter().map(Todo::try_from).collect()
}

/// Converts a `COUNT(*)` result into an unsigned total.
pub(crate) fn count_to_total(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

/// Returns the current time at the precision every backend can store.
pub(crate) fn current_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Truncates a client supplied timestamp to the stored precision.
pub(crate) fn storable(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp.trunc_subsecs(6)
}

/// Returns the timestamp to stamp on a mutation of a record.
///
/// Never earlier than `created_at`, even if the wall clock stepped back.
pub(crate) fn refreshed_timestamp(created_at: DateTime<Utc>) -> DateTime<Utc> {
    current_timestamp().max(created_at)
}

// =============================================================================
// Todo Repository
// =============================================================================

/// Repository trait for `Todo` entities.
///
/// Every operation only sees active rows. Identifiers that belong to a
/// soft-deleted row yield `RepositoryError::NotFound`, same as unknown ones.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Inserts a new row and returns it with its assigned id and timestamps.
    async fn create(&self, todo: NewTodo) -> Result<Todo, RepositoryError>;

    /// Fetches an active row by id.
    async fn find_by_id(&self, id: TodoId) -> Result<Todo, RepositoryError>;

    /// Lists active rows, newest first (`created_at DESC, id DESC`).
    async fn list(&self, pagination: Pagination) -> Result<PaginatedResult<Todo>, RepositoryError>;

    /// Lists active rows with the given completion state, newest first.
    async fn list_by_completed(
        &self,
        completed: bool,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Todo>, RepositoryError>;

    /// Replaces the mutable fields of an active row and refreshes `updated_at`.
    ///
    /// Returns the row as stored.
    async fn update(&self, todo: Todo) -> Result<Todo, RepositoryError>;

    /// Soft-deletes an active row by stamping `deleted_at`.
    async fn delete(&self, id: TodoId) -> Result<(), RepositoryError>;
}

// =============================================================================
// Tests
// =============================================================================
