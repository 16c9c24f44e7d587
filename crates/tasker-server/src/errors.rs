//! API error type and its HTTP mapping.
//!
//! Every failure leaves the server as `{"error": "<message>"}`. Storage
//! failures are logged with their cause and reported to the client without it.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tasker_core::{StoreError, ValidationError};

/// Errors a request can end in.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body was not parseable JSON.
    #[error("Invalid JSON")]
    InvalidJson,

    /// Body parsed but failed field validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Path id was not a positive integer.
    #[error("Invalid task ID")]
    InvalidId,

    /// No task with the requested id.
    #[error("Task not found")]
    NotFound,

    /// Another task already uses the title.
    #[error("Task title must be unique")]
    Conflict,

    /// Body exceeded the extractor's size limit.
    #[error("Request body too large")]
    PayloadTooLarge,

    /// Known path, unsupported method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Path matches no route.
    #[error("Not found")]
    RouteNotFound,

    /// Client exceeded its request budget.
    #[error("Too many requests, slow down.")]
    RateLimited,

    /// Persistence failed for a reason the client cannot act on.
    #[error("Internal server error")]
    Storage(#[source] StoreError),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidJson | Self::Validation(_) | Self::InvalidId | Self::Conflict => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound,
            StoreError::Conflict(_) => Self::Conflict,
            other => Self::Storage(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Storage(ref cause) = self {
            tracing::error!(error = %cause, "storage failure");
        }
        let body = json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}
