use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::{debates::error::DebateError, store::StoreError};

/// Error type every handler returns.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Debate(#[from] DebateError),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Debate(e.into())
    }
}

#[derive(Debug, Serialize)]
struct ErrorSource {
    path: String,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    success: bool,
    message: String,
    error_sources: Vec<ErrorSource>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Debate(e) => match e {
                DebateError::NotFound(_) => StatusCode::NOT_FOUND,
                DebateError::Forbidden => StatusCode::FORBIDDEN,
                DebateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
                DebateError::AlreadyJoined(_)
                | DebateError::AlreadyVoted
                | DebateError::DebateClosed
                | DebateError::ContentRejected(_)
                | DebateError::EditWindowExpired
                | DebateError::Validation(_) => StatusCode::BAD_REQUEST,
            },
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        if self.status().is_server_error() {
            "Something went wrong!".to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = ?self, "request failed");
        }
        let message = self.public_message();
        let body = ErrorBody {
            success: false,
            error_sources: vec![ErrorSource {
                path: String::new(),
                message: message.clone(),
            }],
            message,
        };
        (status, Json(body)).into_response()
    }
}
