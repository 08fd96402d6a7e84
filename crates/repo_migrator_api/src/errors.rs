//! Error handling and HTTP error conversion.
//!
//! Every failure leaves the service as a JSON body of the shape
//! `{"error": ..., "details": ..., "code": ...}`. Migration failures keep the status code of
//! their [`MigrationResult`]; the other cases map to fixed statuses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use repo_migrator_core::{MigrationResult, ValidationError};
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Short summary
    pub error: String,

    /// Human-readable detail
    pub details: String,

    /// Machine-readable error code
    pub code: String,
}

/// Errors returned by handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or wrong secret, or a bad webhook signature.
    Unauthorized(String),

    BadRequest(String),

    NotFound(String),

    /// A migration ran and reported an error.
    Migration(MigrationResult),

    Internal(String),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Migration(result) => StatusCode::from_u16(result.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorResponse {
        let (error, details, code) = match self {
            ApiError::Unauthorized(details) => ("Unauthorized", details.clone(), "UNAUTHORIZED"),
            ApiError::BadRequest(details) => ("Bad request", details.clone(), "VALIDATION_ERROR"),
            ApiError::NotFound(details) => ("Not found", details.clone(), "NOT_FOUND"),
            ApiError::Migration(result) => (
                "Migration failed",
                result.error_message().unwrap_or_default().to_string(),
                result
                    .error_code()
                    .map(|code| code.as_str())
                    .unwrap_or("UNKNOWN"),
            ),
            // Internal details stay in the logs.
            ApiError::Internal(_) => (
                "Internal server error",
                "An internal error occurred".to_string(),
                "INTERNAL_ERROR",
            ),
        };

        ErrorResponse {
            error: error.to_string(),
            details,
            code: code.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = self.body();
        log_error(&self, status);
        (status, Json(body)).into_response()
    }
}

/// Log error with appropriate level based on HTTP status
fn log_error(error: &ApiError, status: StatusCode) {
    if status.is_server_error() {
        tracing::error!("API error: {} - {:?}", status, error);
    } else {
        tracing::warn!("API error: {} - {:?}", status, error);
    }
}
