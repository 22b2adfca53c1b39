//! API error handling.
//!
//! Every failure leaves the service as an `ErrorResponse` JSON body
//! (`{"error", "message", "code"}`) with a matching status code.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

use crate::service::ServiceError;

/// Error category for a malformed path id.
pub const INVALID_ID: &str = "Invalid ID";
/// Error category for a malformed or invalid body.
pub const INVALID_DATA: &str = "Invalid Data";
/// Error category for malformed query parameters.
pub const INVALID_QUERY: &str = "Invalid Query";

// =============================================================================
// Error Response Body
// =============================================================================

/// Error body returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short category, e.g. `"Failed to get todo"`.
    pub error: String,
    /// Human-readable detail.
    pub message: String,
    /// HTTP status code, repeated in the body.
    pub code: u16,
}

// =============================================================================
// API Error Response
// =============================================================================

/// API error response containing status code and error details.
#[derive(Debug, Clone)]
pub struct ApiErrorResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Error details.
    pub error: ErrorResponse,
}

impl ApiErrorResponse {
    /// Creates a new API error response.
    #[must_use]
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error: ErrorResponse {
                error: error.into(),
                message: message.into(),
                code: status.as_u16(),
            },
        }
    }

    /// Creates a 400 Bad Request response.
    #[must_use]
    pub fn bad_request(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, message)
    }

    /// Creates the 400 response for a path id that is not a number.
    #[must_use]
    pub fn invalid_id() -> Self {
        Self::bad_request(INVALID_ID, "ID must be a valid number")
    }

    /// Creates a 400 response for a rejected request body.
    #[must_use]
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::bad_request(INVALID_DATA, message)
    }

    /// Creates a 400 response for rejected query parameters.
    #[must_use]
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::bad_request(INVALID_QUERY, message)
    }

    /// Maps a service failure under the given error category.
    ///
    /// `NotFound` becomes 404; everything else is a 500 and is logged.
    #[must_use]
    pub fn from_service(category: &str, error: &ServiceError) -> Self {
        match error {
            ServiceError::NotFound => Self::new(StatusCode::NOT_FOUND, category, error.to_string()),
            ServiceError::Validation(_) | ServiceError::Store(_) => {
                tracing::error!(error = %error, category, "Request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, category, error.to_string())
            }
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<ValidationErrors> for ApiErrorResponse {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, failures)| {
                failures.iter().map(move |failure| {
                    failure.message.as_ref().map_or_else(
                        || format!("{field}: invalid value ({})", failure.code),
                        |message| format!("{field}: {message}"),
                    )
                })
            })
            .collect();
        messages.sort();

        Self::invalid_data(messages.join("; "))
    }
}

impl From<JsonRejection> for ApiErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid_data(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiErrorResponse {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid_query(rejection.body_text())
    }
}

// =============================================================================
// Tests
// =============================================================================
