//! Request middleware: shared-secret authentication and request tracing.

use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::errors::ApiError;
use crate::AppState;

#[cfg(test)]
#[path = "middleware_tests.rs"]
mod tests;

#[derive(Debug, Deserialize)]
pub struct SecretQuery {
    pub secret: Option<String>,
}

/// Rejects requests whose `secret` query parameter does not match the configured secret.
///
/// Returns 401 if the parameter is missing or wrong.
pub async fn secret_middleware(
    State(state): State<AppState>,
    Query(query): Query<SecretQuery>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(provided) = query.secret else {
        return Err(ApiError::Unauthorized("Missing secret".to_string()));
    };
    if !constant_time_eq(provided.as_bytes(), state.secret.expose_secret().as_bytes()) {
        tracing::warn!(uri = %request.uri().path(), "Rejected request with wrong secret");
        return Err(ApiError::Unauthorized("Invalid secret".to_string()));
    }
    Ok(next.run(request).await)
}

/// Compares without short-circuiting on the first differing byte.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Request tracing middleware.
///
/// Adds a request ID to the log records of every request.
pub async fn tracing_middleware(request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();

    tracing::info!(
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        "Request started"
    );

    let response = next.run(request).await;

    tracing::info!(
        request_id = %request_id,
        status = %response.status(),
        "Request completed"
    );

    response
}
