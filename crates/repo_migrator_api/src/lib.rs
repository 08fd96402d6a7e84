//! HTTP surface of the repository migrator.
//!
//! Exposes the registered migrations, the branch protection modernization and the release
//! webhook over HTTP. Trigger endpoints require the shared `secret` query parameter; the
//! webhook is authenticated by its HMAC signature instead.
//!
//! This crate only translates between HTTP and [`MigrationService`]; all behaviour lives in
//! `repo_migrator_core`.

use std::sync::Arc;

use auth_handler::{GitHubAppTokenProvider, StaticTokenProvider, TokenProvider};
use config_manager::MigrationSettings;
use prometheus::Registry;
use repo_migrator_core::{
    migrations::default_registry, Git2SourceControl, GitHubClientFactory, MigrationDispatcher,
    MigrationService, NpmRegistryClient, PrometheusMigrationMetrics,
};
use secrecy::SecretString;

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use config::{ConfigError, Credentials, LogFormat, ServiceConfig};
pub use errors::{ApiError, ErrorResponse};
pub use server::{ApiConfig, ApiServer};

#[cfg(test)]
mod test_support;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Default API port
pub const DEFAULT_PORT: u16 = 8080;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn MigrationService>,

    /// Value of the `secret` query parameter the trigger endpoints require.
    pub secret: SecretString,

    /// Key of the release webhook signature. Webhooks are rejected when unset.
    pub webhook_secret: Option<SecretString>,

    /// Owner assumed for repository names given without one.
    pub default_owner: Option<String>,

    pub metrics_registry: Registry,
}

impl AppState {
    pub fn new(
        service: Arc<dyn MigrationService>,
        secret: SecretString,
        metrics_registry: Registry,
    ) -> Self {
        Self {
            service,
            secret,
            webhook_secret: None,
            default_owner: None,
            metrics_registry,
        }
    }

    pub fn with_webhook_secret(mut self, secret: SecretString) -> Self {
        self.webhook_secret = Some(secret);
        self
    }

    pub fn with_default_owner(mut self, owner: impl Into<String>) -> Self {
        self.default_owner = Some(owner.into());
        self
    }

    /// Wires the production dispatcher for `config`.
    ///
    /// # Errors
    ///
    /// Fails if the npm registry URL is invalid or the metrics cannot be registered.
    pub fn from_config(config: &ServiceConfig, settings: MigrationSettings) -> anyhow::Result<Self> {
        let token_provider: Arc<dyn TokenProvider> = match &config.credentials {
            Credentials::GitHubApp {
                app_id,
                private_key,
            } => Arc::new(GitHubAppTokenProvider::new(*app_id, private_key.clone())),
            Credentials::Token(token) => Arc::new(StaticTokenProvider::new(token.clone())),
        };

        let registry = Registry::new();
        let metrics = PrometheusMigrationMetrics::new(&registry)?;
        let package_registry = NpmRegistryClient::new(settings.npm_registry_url.parse()?);

        let dispatcher = MigrationDispatcher::new(
            default_registry(),
            token_provider,
            Arc::new(GitHubClientFactory),
            Arc::new(Git2SourceControl::new()),
            Arc::new(package_registry),
            Arc::new(settings),
            Arc::new(metrics),
        );

        let mut state = Self::new(Arc::new(dispatcher), config.secret.clone(), registry);
        state.webhook_secret = config.webhook_secret.clone();
        state.default_owner = config.default_owner.clone();
        Ok(state)
    }
}
