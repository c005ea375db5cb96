//! HTTP error mapping.

use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::{IngestionError, QueryError};

const INTERNAL_MESSAGE: &str = "Internal server error";

/// An error response: `{ "error": message }` with a status code.
///
/// Server-side failures are logged when converted and reach the client only as a generic
/// message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Log `err` and return an opaque 500.
    pub fn internal(err: &dyn fmt::Display) -> Self {
        tracing::error!(error = %err, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl From<IngestionError> for ApiError {
    fn from(err: IngestionError) -> Self {
        match &err {
            // Keeps 413 for bodies over the size limit.
            IngestionError::Multipart(inner) if !inner.status().is_server_error() => {
                Self::new(inner.status(), err.to_string())
            }
            _ if err.is_client_error() => Self::bad_request(err.to_string()),
            _ => Self::internal(&err),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::NotFound => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            QueryError::InvalidColumn { .. } | QueryError::InvalidPage => Self::bad_request(err.to_string()),
            QueryError::Store(ref inner) => Self::internal(inner),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::internal(&err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: &self.message })).into_response()
    }
}
