use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt::Display;

use crate::lifecycle::LifecycleError;
use crate::store::StoreError;

pub type AppResult<T> = Result<T, AppError>;

/// Error surfaced across the HTTP boundary. Workflow failures carry a
/// machine-readable `kind` alongside the human-readable message so callers
/// can branch without parsing text.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", "unauthorized")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", message)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", "resource not found")
    }

    pub fn internal<E: Display>(error: E) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            error.to_string(),
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = Json(ErrorResponse {
            error: self.message,
            kind: self.kind,
        });
        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

impl From<LifecycleError> for AppError {
    fn from(value: LifecycleError) -> Self {
        let message = value.to_string();
        match value {
            LifecycleError::Validation(_) => AppError::bad_request(message),
            LifecycleError::InvalidTransition(_) => {
                AppError::new(StatusCode::CONFLICT, "invalid_transition", message)
            }
            LifecycleError::Forbidden(_) => AppError::forbidden(message),
            LifecycleError::ConcurrentModification => AppError::new(
                StatusCode::CONFLICT,
                "concurrent_modification",
                message,
            ),
            LifecycleError::UnsupportedRevisionScheme(_) => AppError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "unsupported_revision_scheme",
                message,
            ),
            LifecycleError::NotFound => AppError::not_found(),
            LifecycleError::Store(err) => AppError::internal(err),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => AppError::not_found(),
            StoreError::Conflict(message) => {
                AppError::new(StatusCode::CONFLICT, "concurrent_modification", message)
            }
            other => AppError::internal(other),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError::internal(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        AppError::internal(value)
    }
}
