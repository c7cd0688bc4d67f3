use axum::{
    async_trait,
    extract::{rejection::JsonRejection, rejection::QueryRejection, FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::ApiError;

/// Request input that can reject itself before it reaches a service.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// `Json<T>` that reports malformed or invalid bodies as validation errors.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| {
                warn!(error = %e.body_text(), "rejected json body");
                ApiError::Validation(e.body_text())
            })?;
        value.validate().map_err(|msg| {
            warn!(%msg, "invalid request body");
            ApiError::Validation(msg)
        })?;
        Ok(ValidJson(value))
    }
}

/// `Query<T>` counterpart of [`ValidJson`].
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e: QueryRejection| {
                warn!(error = %e.body_text(), "rejected query string");
                ApiError::Validation(e.body_text())
            })?;
        value.validate().map_err(ApiError::Validation)?;
        Ok(ValidQuery(value))
    }
}
