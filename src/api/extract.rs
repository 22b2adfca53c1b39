//! Request extractors that reject with the API's own error body.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use super::error::ApiErrorResponse;
use crate::domain::TodoId;

/// JSON body that has been deserialized and validated.
///
/// Malformed JSON and rule violations both reject with 400 `Invalid Data`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiErrorResponse;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// The `{id}` path segment parsed as a todo identifier.
///
/// Anything but an unsigned integer rejects with 400 `Invalid ID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodoPath(pub TodoId);

impl<S> FromRequestParts<S> for TodoPath
where
    S: Send + Sync,
{
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiErrorResponse::invalid_id())?;

        raw.parse::<u64>()
            .map(|value| Self(TodoId::new(value)))
            .map_err(|_| ApiErrorResponse::invalid_id())
    }
}
