//! Business rules for todos.
//!
//! `TodoService` sits between the HTTP handlers and the repository. It owns
//! defaulting, the partial-update merge and the pagination arithmetic, and
//! projects stored records into response DTOs.

use std::sync::Arc;

use thiserror::Error;

use crate::api::dto::{CreateTodoRequest, TodoListResponse, TodoResponse, UpdateTodoRequest};
use crate::domain::{NewTodo, Priority, Todo, TodoId};
use crate::infrastructure::{PaginatedResult, Pagination, RepositoryError, TodoRepository};

/// Page number used when the client sends none or a non-positive one.
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when the client sends none or a non-positive one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

// =============================================================================
// Service Error
// =============================================================================

/// Errors returned by `TodoService`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// No active todo has the requested id.
    #[error("todo not found")]
    NotFound,

    /// A field value failed a business rule.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The repository failed for a reason other than a missing row.
    #[error(transparent)]
    Store(#[from] RepositoryError),
}

impl ServiceError {
    /// Translates a repository failure on a by-id operation.
    fn from_lookup(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound(_) => Self::NotFound,
            other => Self::Store(other),
        }
    }
}

// =============================================================================
// Pagination Helpers
// =============================================================================

/// Clamps a requested page and page size to usable values.
#[must_use]
pub const fn normalize_page(page: i64, page_size: i64) -> (i64, i64) {
    let page = if page < 1 { DEFAULT_PAGE } else { page };
    let page_size = if page_size < 1 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    };
    (page, page_size)
}

/// Number of pages needed to show `total` rows, `page_size` at a time.
///
/// Zero rows need zero pages.
#[must_use]
pub const fn total_pages(total: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

fn parse_priority(value: &str) -> Result<Priority, ServiceError> {
    value
        .parse::<Priority>()
        .map_err(|error| ServiceError::Validation(error.to_string()))
}

// =============================================================================
// Todo Service
// =============================================================================

/// Application service for todo use cases.
#[derive(Clone)]
pub struct TodoService {
    repository: Arc<dyn TodoRepository + Send + Sync>,
}

impl std::fmt::Debug for TodoService {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("TodoService").finish_non_exhaustive()
    }
}

impl TodoService {
    /// Creates a service over the given repository.
    #[must_use]
    pub fn new(repository: Arc<dyn TodoRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    /// Creates a todo.
    ///
    /// An absent or empty priority becomes `medium`; new todos always start
    /// incomplete.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for an unknown priority and
    /// `ServiceError::Store` if the insert fails.
    pub async fn create(&self, request: CreateTodoRequest) -> Result<TodoResponse, ServiceError> {
        let priority = match request.priority.as_deref() {
            None | Some("") => Priority::default(),
            Some(value) => parse_priority(value)?,
        };

        let new_todo = NewTodo {
            title: request.title,
            description: request.description,
            completed: false,
            priority,
            due_date: request.due_date,
        };

        let todo = self.repository.create(new_todo).await?;
        tracing::info!(todo_id = %todo.id, "Todo created");
        Ok(TodoResponse::from(todo))
    }

    /// Fetches an active todo.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for an unknown or deleted id.
    pub async fn get_by_id(&self, id: TodoId) -> Result<TodoResponse, ServiceError> {
        self.find(id).await.map(TodoResponse::from)
    }

    /// Lists active todos, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Store` if the query fails.
    pub async fn get_all(
        &self,
        page: i64,
        page_size: i64,
    ) -> Result<TodoListResponse, ServiceError> {
        let (page, page_size) = normalize_page(page, page_size);
        let result = self
            .repository
            .list(Pagination::for_page(page, page_size))
            .await?;
        Ok(Self::list_response(result, page, page_size))
    }

    /// Lists active todos with the given completion state, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Store` if the query fails.
    pub async fn get_all_by_completed(
        &self,
        completed: bool,
        page: i64,
        page_size: i64,
    ) -> Result<TodoListResponse, ServiceError> {
        let (page, page_size) = normalize_page(page, page_size);
        let result = self
            .repository
            .list_by_completed(completed, Pagination::for_page(page, page_size))
            .await?;
        Ok(Self::list_response(result, page, page_size))
    }

    /// Applies a partial update.
    ///
    /// Fields absent from the request keep their stored value. A `due_date`
    /// of `null` clears the due date.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for an unknown or deleted id and
    /// `ServiceError::Validation` for an unknown priority.
    pub async fn update(
        &self,
        id: TodoId,
        request: UpdateTodoRequest,
    ) -> Result<TodoResponse, ServiceError> {
        let mut todo = self.find(id).await?;

        if let Some(title) = request.title {
            todo.title = title;
        }
        if let Some(description) = request.description {
            todo.description = description;
        }
        if let Some(priority) = request.priority.as_deref() {
            todo.priority = parse_priority(priority)?;
        }
        if let Some(due_date) = request.due_date {
            todo.due_date = due_date;
        }
        if let Some(completed) = request.completed {
            todo.completed = completed;
        }

        let todo = self.save(todo).await?;
        tracing::info!(todo_id = %todo.id, "Todo updated");
        Ok(TodoResponse::from(todo))
    }

    /// Soft-deletes a todo.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for an unknown or already deleted id.
    pub async fn delete(&self, id: TodoId) -> Result<(), ServiceError> {
        self.find(id).await?;
        self.repository
            .delete(id)
            .await
            .map_err(ServiceError::from_lookup)?;
        tracing::info!(todo_id = %id, "Todo deleted");
        Ok(())
    }

    /// Marks a todo completed.
    ///
    /// Completing an already completed todo succeeds and still refreshes
    /// `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for an unknown or deleted id.
    pub async fn complete(&self, id: TodoId) -> Result<TodoResponse, ServiceError> {
        let mut todo = self.find(id).await?;
        todo.completed = true;

        let todo = self.save(todo).await?;
        tracing::info!(todo_id = %todo.id, "Todo completed");
        Ok(TodoResponse::from(todo))
    }

    async fn find(&self, id: TodoId) -> Result<Todo, ServiceError> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(ServiceError::from_lookup)
    }

    async fn save(&self, todo: Todo) -> Result<Todo, ServiceError> {
        self.repository
            .update(todo)
            .await
            .map_err(ServiceError::from_lookup)
    }

    fn list_response(result: PaginatedResult<Todo>, page: i64, page_size: i64) -> TodoListResponse {
        let pages = total_pages(result.total, u64::try_from(page_size).unwrap_or(1));
        TodoListResponse {
            data: result.items.into_iter().map(TodoResponse::from).collect(),
            total: result.total,
            page,
            page_size,
            total_pages: pages,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MockTodoRepository;
    use chrono::{TimeZone, Utc};
    use mockall::predicate::eq;
    use proptest::prelude::*;
    use rstest::rstest;

    fn stored(id: u64, title: &str) -> Todo {
        let created_at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        Todo {
            id: TodoId::new(id),
            title: title.to_string(),
            description: "Original description".to_string(),
            completed: false,
            priority: Priority::Low,
            due_date: Some(Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap()),
            created_at,
            updated_at: created_at,
            deleted_at: None,
        }
    }

    fn service(mock: MockTodoRepository) -> TodoService {
        TodoService::new(Arc::new(mock))
    }

    fn create_request(title: &str, priority: Option<&str>) -> CreateTodoRequest {
        CreateTodoRequest {
            title: title.to_string(),
            description: String::new(),
            priority: priority.map(str::to_string),
            due_date: None,
        }
    }

    #[rstest]
    #[case(0, 0, 1, 10)]
    #[case(-3, -1, 1, 10)]
    #[case(2, 25, 2, 25)]
    fn test_normalize_page(
        #[case] page: i64,
        #[case] size: i64,
        #[case] expected_page: i64,
        #[case] expected_size: i64,
    ) {
        assert_eq!(normalize_page(page, size), (expected_page, expected_size));
    }

    #[rstest]
    #[case(0, 10, 0)]
    #[case(3, 10, 1)]
    #[case(10, 10, 1)]
    #[case(25, 10, 3)]
    fn test_total_pages(#[case] total: u64, #[case] size: u64, #[case] expected: u64) {
        assert_eq!(total_pages(total, size), expected);
    }

    proptest! {
        #[test]
        fn prop_total_pages_covers_every_row(total in 0u64..100_000, size in 1u64..1_000) {
            let pages = total_pages(total, size);
            prop_assert!(pages * size >= total);
            if total > 0 {
                prop_assert!((pages - 1) * size < total);
            } else {
                prop_assert_eq!(pages, 0);
            }
        }
    }

    #[rstest]
    #[case(None, Priority::Medium)]
    #[case(Some(""), Priority::Medium)]
    #[case(Some("high"), Priority::High)]
    #[tokio::test]
    async fn test_create_assigns_priority(
        #[case] requested: Option<&str>,
        #[case] expected: Priority,
    ) {
        let mut mock = MockTodoRepository::new();
        mock.expect_create()
            .withf(move |todo| todo.priority == expected && !todo.completed)
            .times(1)
            .returning(|todo| {
                let mut created = stored(1, &todo.title);
                created.priority = todo.priority;
                created.completed = todo.completed;
                Ok(created)
            });

        let response = service(mock)
            .create(create_request("Task", requested))
            .await
            .unwrap();

        assert_eq!(response.priority, expected);
        assert!(!response.completed);
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_rejects_unknown_priority_without_store_call() {
        let mut mock = MockTodoRepository::new();
        mock.expect_create().never();

        let error = service(mock)
            .create(create_request("Task", Some("urgent")))
            .await
            .unwrap_err();

        assert!(matches!(error, ServiceError::Validation(_)));
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_propagates_store_failure() {
        let mut mock = MockTodoRepository::new();
        mock.expect_create()
            .returning(|_| Err(RepositoryError::Database("disk full".to_string())));

        let error = service(mock)
            .create(create_request("Task", None))
            .await
            .unwrap_err();

        assert_eq!(
            error,
            ServiceError::Store(RepositoryError::Database("disk full".to_string()))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_get_by_id_translates_not_found() {
        let mut mock = MockTodoRepository::new();
        mock.expect_find_by_id()
            .with(eq(TodoId::new(999)))
            .returning(|id| Err(RepositoryError::todo_not_found(id)));

        let error = service(mock).get_by_id(TodoId::new(999)).await.unwrap_err();

        assert_eq!(error, ServiceError::NotFound);
        assert_eq!(error.to_string(), "todo not found");
    }

    #[rstest]
    #[tokio::test]
    async fn test_get_by_id_passes_database_errors_through() {
        let mut mock = MockTodoRepository::new();
        mock.expect_find_by_id()
            .returning(|_| Err(RepositoryError::Database("connection reset".to_string())));

        let error = service(mock).get_by_id(TodoId::new(1)).await.unwrap_err();

        assert!(matches!(error, ServiceError::Store(RepositoryError::Database(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn test_get_all_normalizes_and_counts_pages() {
        let mut mock = MockTodoRepository::new();
        mock.expect_list()
            .with(eq(Pagination::new(10, 0)))
            .times(1)
            .returning(|_| {
                let items = (1..=10).map(|id| stored(id, "Task")).collect();
                Ok(PaginatedResult::new(items, 25))
            });

        let response = service(mock).get_all(0, 0).await.unwrap();

        assert_eq!(response.page, 1);
        assert_eq!(response.page_size, 10);
        assert_eq!(response.total, 25);
        assert_eq!(response.total_pages, 3);
        assert_eq!(response.data.len(), 10);
    }

    #[rstest]
    #[tokio::test]
    async fn test_get_all_by_completed_uses_filtered_query() {
        let mut mock = MockTodoRepository::new();
        mock.expect_list().never();
        mock.expect_list_by_completed()
            .with(eq(true), eq(Pagination::new(5, 5)))
            .times(1)
            .returning(|_, _| Ok(PaginatedResult::new(vec![], 7)));

        let response = service(mock).get_all_by_completed(true, 2, 5).await.unwrap();

        assert_eq!(response.total, 7);
        assert_eq!(response.total_pages, 2);
        assert!(response.data.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_only_touches_present_fields() {
        let original = stored(3, "Original");
        let expected = original.clone();

        let mut mock = MockTodoRepository::new();
        mock.expect_find_by_id()
            .returning(move |_| Ok(original.clone()));
        mock.expect_update()
            .withf(move |todo| {
                todo.title == "Renamed"
                    && todo.description == expected.description
                    && todo.priority == expected.priority
                    && todo.due_date == expected.due_date
                    && todo.completed == expected.completed
            })
            .times(1)
            .returning(Ok);

        let request = UpdateTodoRequest {
            title: Some("Renamed".to_string()),
            ..UpdateTodoRequest::default()
        };
        let response = service(mock).update(TodoId::new(3), request).await.unwrap();

        assert_eq!(response.title, "Renamed");
        assert_eq!(response.description, "Original description");
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_with_null_due_date_clears_it() {
        let mut mock = MockTodoRepository::new();
        mock.expect_find_by_id()
            .returning(|id| Ok(stored(id.value(), "Dated")));
        mock.expect_update()
            .withf(|todo| todo.due_date.is_none())
            .returning(Ok);

        let request = UpdateTodoRequest {
            due_date: Some(None),
            ..UpdateTodoRequest::default()
        };
        let response = service(mock).update(TodoId::new(4), request).await.unwrap();

        assert!(response.due_date.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_unknown_id_never_writes() {
        let mut mock = MockTodoRepository::new();
        mock.expect_find_by_id()
            .returning(|id| Err(RepositoryError::todo_not_found(id)));
        mock.expect_update().never();

        let error = service(mock)
            .update(TodoId::new(999), UpdateTodoRequest::default())
            .await
            .unwrap_err();

        assert_eq!(error, ServiceError::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_checks_existence_first() {
        let mut mock = MockTodoRepository::new();
        mock.expect_find_by_id()
            .returning(|id| Err(RepositoryError::todo_not_found(id)));
        mock.expect_delete().never();

        let error = service(mock).delete(TodoId::new(999)).await.unwrap_err();

        assert_eq!(error, ServiceError::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_existing_todo() {
        let mut mock = MockTodoRepository::new();
        mock.expect_find_by_id()
            .returning(|id| Ok(stored(id.value(), "Doomed")));
        mock.expect_delete()
            .with(eq(TodoId::new(5)))
            .times(1)
            .returning(|_| Ok(()));

        service(mock).delete(TodoId::new(5)).await.unwrap();
    }

    #[rstest]
    #[case(false)]
    #[case(true)]
    #[tokio::test]
    async fn test_complete_always_sets_completed(#[case] already_completed: bool) {
        let mut mock = MockTodoRepository::new();
        mock.expect_find_by_id().returning(move |id| {
            let mut todo = stored(id.value(), "Chore");
            todo.completed = already_completed;
            Ok(todo)
        });
        mock.expect_update()
            .withf(|todo| todo.completed)
            .times(1)
            .returning(Ok);

        let response = service(mock).complete(TodoId::new(6)).await.unwrap();

        assert!(response.completed);
    }
}
