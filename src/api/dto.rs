//! Data Transfer Objects for API requests and responses.
//!
//! This module contains DTOs that are separate from domain models,
//! providing a clean API contract. Request DTOs carry their validation
//! rules; the `ValidatedJson` extractor enforces them before any handler
//! runs.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::{Priority, Todo, TodoId};

// =============================================================================
// Field Validators
// =============================================================================

fn priority_error() -> ValidationError {
    let mut error = ValidationError::new("priority");
    error.message = Some(Cow::Borrowed(
        "priority must be one of: low, medium, high",
    ));
    error
}

/// Create accepts an empty priority, which later defaults to medium.
fn validate_create_priority(priority: &str) -> Result<(), ValidationError> {
    if priority.is_empty() || priority.parse::<Priority>().is_ok() {
        Ok(())
    } else {
        Err(priority_error())
    }
}

fn validate_update_priority(priority: &str) -> Result<(), ValidationError> {
    priority
        .parse::<Priority>()
        .map(|_| ())
        .map_err(|_| priority_error())
}

/// Distinguishes an explicit `null` from an absent field.
///
/// Used with `#[serde(default)]`: absent stays `None`, `null` becomes
/// `Some(None)`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Reads an explicit `null` as the type's default value.
fn deserialize_null_as_default<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: Deserialize<'de> + Default,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// =============================================================================
// Request DTOs
// =============================================================================

/// Request DTO for creating a new todo.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateTodoRequest {
    /// Title of the todo (1-255 characters).
    #[validate(length(
        min = 1,
        max = 255,
        message = "title must be between 1 and 255 characters"
    ))]
    pub title: String,
    /// Free-form description (at most 1000 characters); `null` means empty.
    #[serde(default, deserialize_with = "deserialize_null_as_default")]
    #[validate(length(max = 1000, message = "description must be at most 1000 characters"))]
    pub description: String,
    /// `low`, `medium` or `high`; absent or empty means `medium`.
    #[serde(default)]
    #[validate(custom(function = "validate_create_priority"))]
    pub priority: Option<String>,
    /// Optional due date (RFC 3339).
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Request DTO for a partial update.
///
/// Every field is optional; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateTodoRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(
        min = 1,
        max = 255,
        message = "title must be between 1 and 255 characters"
    ))]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000, message = "description must be at most 1000 characters"))]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_update_priority"))]
    pub priority: Option<String>,
    /// `None`: leave unchanged. `Some(None)`: clear. `Some(Some(d))`: set.
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// Query parameters for listing todos.
///
/// Values are kept as raw strings: non-numeric paging values fall back to
/// the defaults instead of failing the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTodosQuery {
    /// Page number, 1-indexed.
    pub page: Option<String>,
    /// Page size.
    pub size: Option<String>,
    /// Alias for `size`.
    pub page_size: Option<String>,
    /// Completion filter, `true` or `false`.
    pub completed: Option<String>,
}

/// Error returned when the `completed` filter is not a boolean.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("completed must be 'true' or 'false', got '{0}'")]
pub struct InvalidCompletedFilter(pub String);

impl ListTodosQuery {
    /// Requested page, or 0 (normalized later) when absent or malformed.
    #[must_use]
    pub fn page(&self) -> i64 {
        Self::lenient_number(self.page.as_deref())
    }

    /// Requested page size; `size` wins over `page_size`.
    #[must_use]
    pub fn page_size(&self) -> i64 {
        Self::lenient_number(self.size.as_deref().or(self.page_size.as_deref()))
    }

    /// Parsed completion filter.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCompletedFilter` for anything but `true`/`false`.
    pub fn completed(&self) -> Result<Option<bool>, InvalidCompletedFilter> {
        match self.completed.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some("true") => Ok(Some(true)),
            Some("false") => Ok(Some(false)),
            Some(other) => Err(InvalidCompletedFilter(other.to_string())),
        }
    }

    fn lenient_number(value: Option<&str>) -> i64 {
        value
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0)
    }
}

// =============================================================================
// Response DTOs
// =============================================================================

/// Response DTO for a todo. Deletion state is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoResponse {
    pub id: TodoId,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Todo> for TodoResponse {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title,
            description: todo.description,
            completed: todo.completed,
            priority: todo.priority,
            due_date: todo.due_date,
            created_at: todo.created_at,
            updated_at: todo.updated_at,
        }
    }
}

/// One page of todos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoListResponse {
    pub data: Vec<TodoResponse>,
    /// Count of all matching active todos.
    pub total: u64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: u64,
}

/// Envelope for successful responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> SuccessResponse<T> {
    /// Envelope carrying only a payload.
    #[must_use]
    pub const fn data(data: T) -> Self {
        Self {
            message: None,
            data: Some(data),
        }
    }

    /// Envelope carrying a message and a payload.
    #[must_use]
    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl SuccessResponse<()> {
    /// Envelope carrying only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            data: None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn create_request(value: serde_json::Value) -> CreateTodoRequest {
        serde_json::from_value(value).unwrap()
    }

    #[rstest]
    fn test_create_request_defaults() {
        let request = create_request(json!({"title": "Buy milk"}));
        assert_eq!(request.description, "");
        assert!(request.priority.is_none());
        assert!(request.due_date.is_none());
        assert!(request.validate().is_ok());
    }

    #[rstest]
    fn test_create_request_null_description_is_empty() {
        let request = create_request(json!({"title": "ok", "description": null}));
        assert_eq!(request.description, "");
        assert!(request.validate().is_ok());
    }

    #[rstest]
    #[case(json!({"title": ""}), "title")]
    #[case(json!({"title": "x".repeat(256)}), "title")]
    #[case(json!({"title": "ok", "description": "d".repeat(1001)}), "description")]
    #[case(json!({"title": "ok", "priority": "urgent"}), "priority")]
    fn test_create_request_rejects(#[case] body: serde_json::Value, #[case] field: &str) {
        let errors = create_request(body).validate().unwrap_err();
        assert!(errors.field_errors().contains_key(field));
    }

    #[rstest]
    #[case("")]
    #[case("low")]
    #[case("high")]
    fn test_create_request_accepts_priority(#[case] priority: &str) {
        let request = create_request(json!({"title": "ok", "priority": priority}));
        assert!(request.validate().is_ok());
    }

    #[rstest]
    fn test_title_length_counts_characters() {
        let request = create_request(json!({"title": "é".repeat(255)}));
        assert!(request.validate().is_ok());
    }

    #[rstest]
    fn test_update_request_distinguishes_null_due_date() {
        let absent: UpdateTodoRequest = serde_json::from_value(json!({})).unwrap();
        let cleared: UpdateTodoRequest =
            serde_json::from_value(json!({"due_date": null})).unwrap();
        let set: UpdateTodoRequest =
            serde_json::from_value(json!({"due_date": "2025-06-01T10:00:00Z"})).unwrap();

        assert_eq!(absent.due_date, None);
        assert_eq!(cleared.due_date, Some(None));
        assert!(matches!(set.due_date, Some(Some(_))));
    }

    #[rstest]
    #[case(json!({"priority": ""}))]
    #[case(json!({"title": ""}))]
    fn test_update_request_rejects(#[case] body: serde_json::Value) {
        let request: UpdateTodoRequest = serde_json::from_value(body).unwrap();
        assert!(request.validate().is_err());
    }

    #[rstest]
    #[case(None, None, None, 0, 0)]
    #[case(Some("2"), Some("25"), None, 2, 25)]
    #[case(Some("abc"), None, Some("5"), 0, 5)]
    #[case(None, Some("3"), Some("5"), 0, 3)]
    fn test_list_query_paging(
        #[case] page: Option<&str>,
        #[case] size: Option<&str>,
        #[case] page_size: Option<&str>,
        #[case] expected_page: i64,
        #[case] expected_size: i64,
    ) {
        let query = ListTodosQuery {
            page: page.map(str::to_string),
            size: size.map(str::to_string),
            page_size: page_size.map(str::to_string),
            completed: None,
        };
        assert_eq!(query.page(), expected_page);
        assert_eq!(query.page_size(), expected_size);
    }

    #[rstest]
    #[case(None, Ok(None))]
    #[case(Some("true"), Ok(Some(true)))]
    #[case(Some("false"), Ok(Some(false)))]
    #[case(Some("yes"), Err(InvalidCompletedFilter("yes".to_string())))]
    fn test_list_query_completed(
        #[case] value: Option<&str>,
        #[case] expected: Result<Option<bool>, InvalidCompletedFilter>,
    ) {
        let query = ListTodosQuery {
            completed: value.map(str::to_string),
            ..ListTodosQuery::default()
        };
        assert_eq!(query.completed(), expected);
    }

    #[rstest]
    fn test_success_response_omits_missing_parts() {
        let json = serde_json::to_value(SuccessResponse::message("Todo successfully deleted"))
            .unwrap();
        assert_eq!(json, json!({"message": "Todo successfully deleted"}));

        let json = serde_json::to_value(SuccessResponse::data(1)).unwrap();
        assert_eq!(json, json!({"data": 1}));
    }
}
