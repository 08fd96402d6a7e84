//! HTTP routing configuration
//!
//! # Route Structure
//!
//! - GET|POST /update-github-actions - Run `update-github-actions`
//! - POST     /update-dependencies - Run `update-dependencies`
//! - POST     /migrations/:name - Run any registered migration
//! - POST     /branch-protection/modernize - Replace classic protection with a ruleset
//! - POST     /webhooks/release - Release webhook (signature authenticated)
//! - GET      /health - Health check
//! - GET      /metrics - Prometheus metrics
//!
//! All routes except the webhook, health and metrics require the `secret` query parameter.

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::{
    timeout::TimeoutLayer,
    trace::{DefaultOnResponse, TraceLayer},
};

use crate::{handlers, middleware as api_middleware, AppState};

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;

/// Upper bound for one request. Clone-based migrations need well over the usual limit.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Create the complete router with all routes and middleware configured.
pub fn create_router(state: AppState) -> Router {
    // Spans carry the path only; the query holds the shared secret.
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path()
            )
        })
        .on_response(DefaultOnResponse::new());

    let protected_routes = Router::new()
        .route(
            "/update-github-actions",
            get(handlers::update_github_actions).post(handlers::update_github_actions),
        )
        .route("/update-dependencies", post(handlers::update_dependencies))
        .route("/migrations/:name", post(handlers::run_migration))
        .route(
            "/branch-protection/modernize",
            post(handlers::modernize_branch_protection),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api_middleware::secret_middleware,
        ));

    Router::new()
        .merge(protected_routes)
        .route("/webhooks/release", post(handlers::release_webhook))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(api_middleware::tracing_middleware))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(trace_layer)
        .with_state(state)
}
