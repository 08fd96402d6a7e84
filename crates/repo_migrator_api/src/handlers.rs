//! HTTP request handlers.
//!
//! Handlers parse the query, call the [`MigrationService`](repo_migrator_core::MigrationService)
//! and translate the [`MigrationResult`] into a response. Error results become [`ApiError`]s
//! that keep the result's status code.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use prometheus::{Encoder, TextEncoder};
use repo_migrator_core::{
    verify_signature, MigrationParameters, MigrationResult, ReleaseEvent, RepositoryRef,
    SIGNATURE_HEADER,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::errors::ApiError;
use crate::AppState;

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;

/// Migration run by `/update-github-actions`.
pub const UPDATE_GITHUB_ACTIONS: &str = "update-github-actions";

/// Migration run by `/update-dependencies`.
pub const UPDATE_DEPENDENCIES: &str = "update-dependencies";

const GITHUB_EVENT_HEADER: &str = "x-github-event";

#[derive(Debug, Deserialize)]
pub struct RepositoryQuery {
    pub repository: Option<String>,
    pub branch: Option<String>,
    pub dependency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyQuery {
    pub repository_name: Option<String>,
    pub dependency: Option<String>,
}

fn parse_repository(
    state: &AppState,
    parameter: &str,
    value: Option<&str>,
) -> Result<RepositoryRef, ApiError> {
    let value = value.ok_or_else(|| {
        ApiError::BadRequest(format!("Missing '{}' parameter", parameter))
    })?;
    Ok(RepositoryRef::parse_with_default_owner(
        value,
        state.default_owner.as_deref(),
    )?)
}

/// Success as JSON with the result's status code, failure as an [`ApiError`].
fn json_result(result: MigrationResult) -> Result<Response, ApiError> {
    if result.is_error() {
        return Err(ApiError::Migration(result));
    }
    let status = StatusCode::from_u16(result.status_code()).unwrap_or(StatusCode::OK);
    Ok((status, Json(result)).into_response())
}

/// Handler for `GET|POST /update-github-actions`.
///
/// Responds with plain text on success.
#[instrument(skip_all)]
pub async fn update_github_actions(
    State(state): State<AppState>,
    Query(query): Query<RepositoryQuery>,
) -> Result<Response, ApiError> {
    let repository = parse_repository(&state, "repository", query.repository.as_deref())?;

    let result = state
        .service
        .run_migration(
            UPDATE_GITHUB_ACTIONS,
            &repository,
            &MigrationParameters::default(),
        )
        .await;
    if result.is_error() {
        return Err(ApiError::Migration(result));
    }

    let status = StatusCode::from_u16(result.status_code()).unwrap_or(StatusCode::OK);
    let message = match result.pull_request() {
        Some(pull_request) => format!(
            "Opened pull request #{} for {}: {}",
            pull_request.number, repository, pull_request.url
        ),
        None => format!("No changes needed for {}", repository),
    };
    Ok((status, message).into_response())
}

/// Handler for `POST /update-dependencies`.
#[instrument(skip_all)]
pub async fn update_dependencies(
    State(state): State<AppState>,
    Query(query): Query<DependencyQuery>,
) -> Result<Response, ApiError> {
    let repository =
        parse_repository(&state, "repositoryName", query.repository_name.as_deref())?;
    let parameters = MigrationParameters {
        dependency: query.dependency.filter(|d| !d.trim().is_empty()),
    };

    let result = state
        .service
        .run_migration(UPDATE_DEPENDENCIES, &repository, &parameters)
        .await;
    json_result(result)
}

/// Handler for `POST /migrations/:name`.
#[instrument(skip_all)]
pub async fn run_migration(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<RepositoryQuery>,
) -> Result<Response, ApiError> {
    if !state.service.has_migration(&name) {
        return Err(ApiError::NotFound(format!("Unknown migration '{}'", name)));
    }
    let repository = parse_repository(&state, "repository", query.repository.as_deref())?;
    let parameters = MigrationParameters {
        dependency: query.dependency.filter(|d| !d.trim().is_empty()),
    };

    let result = state
        .service
        .run_migration(&name, &repository, &parameters)
        .await;
    json_result(result)
}

/// Handler for `POST /branch-protection/modernize`.
#[instrument(skip_all)]
pub async fn modernize_branch_protection(
    State(state): State<AppState>,
    Query(query): Query<RepositoryQuery>,
) -> Result<Response, ApiError> {
    let repository = parse_repository(&state, "repository", query.repository.as_deref())?;
    let branch = query.branch.as_deref().filter(|b| !b.trim().is_empty());

    let result = state
        .service
        .modernize_branch_protection(&repository, branch)
        .await;
    json_result(result)
}

/// Handler for `POST /webhooks/release`.
///
/// Verifies the `X-Hub-Signature-256` header before reading the payload. Deliveries of
/// other event types are acknowledged and ignored.
#[instrument(skip_all)]
pub async fn release_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let Some(secret) = &state.webhook_secret else {
        warn!("Release webhook received but no webhook secret is configured");
        return Err(ApiError::Unauthorized(
            "Webhook secret not configured".to_string(),
        ));
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing signature".to_string()))?;
    if !verify_signature(&body, signature, secret.expose_secret()) {
        return Err(ApiError::Unauthorized("Invalid signature".to_string()));
    }

    if let Some(event) = headers.get(GITHUB_EVENT_HEADER).and_then(|v| v.to_str().ok()) {
        if event != "release" {
            info!(event, "Ignoring webhook event");
            return Ok((StatusCode::OK, format!("Ignored '{}' event", event)).into_response());
        }
    }

    let event: ReleaseEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid release payload: {}", e)))?;

    let result = state.service.handle_release_event(&event).await;
    json_result(result)
}

/// Health check handler
pub async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResponse {
    /// Service status: "healthy" or "unhealthy"
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Current timestamp (ISO 8601)
    pub timestamp: String,
}

/// Prometheus text exposition of the registered metrics.
pub async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&state.metrics_registry.gather(), &mut buffer)
        .map_err(|e| ApiError::Internal(format!("Failed to encode metrics: {}", e)))?;

    Ok((
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response())
}
