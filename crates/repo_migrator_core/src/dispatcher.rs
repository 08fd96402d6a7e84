//! Entry point for every trigger: HTTP requests and release events.
//!
//! The dispatcher resolves credentials for the repository owner, builds a hosting client and
//! hands the named migration to a [`MigrationPipeline`]. Whatever happens, the caller gets a
//! [`MigrationResult`].

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use auth_handler::TokenProvider;
use config_manager::MigrationSettings;
use github_client::{create_token_client, GitHubClient, RepositoryClient};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::errors::{CoreResult, ErrorCode};
use crate::git::SourceControl;
use crate::metrics::{MigrationMetrics, RunOutcome};
use crate::migration::{MigrationParameters, MigrationRegistry};
use crate::npm_registry::PackageRegistry;
use crate::pipeline::MigrationPipeline;
use crate::protection_migration::modernize_branch_protection;
use crate::repository::RepositoryRef;
use crate::result::MigrationResult;

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;

/// Metrics label of the branch protection orchestration.
pub const MODERNIZE_BRANCH_PROTECTION: &str = "modernize-branch-protection";

/// Release webhook action that triggers the release migrations.
pub const RELEASE_PUBLISHED: &str = "published";

/// The subset of a `release` webhook payload the dispatcher reads.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReleaseEvent {
    pub action: String,
    pub repository: ReleaseRepository,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReleaseRepository {
    pub full_name: String,
}

/// Operations the HTTP layer can trigger.
#[async_trait]
pub trait MigrationService: Send + Sync {
    /// Runs a registered migration. Unknown names yield an `UNKNOWN_MIGRATION` result.
    async fn run_migration(
        &self,
        name: &str,
        repository: &RepositoryRef,
        parameters: &MigrationParameters,
    ) -> MigrationResult;

    /// Replaces the classic protection of `branch` (default: the default branch) with a
    /// ruleset.
    async fn modernize_branch_protection(
        &self,
        repository: &RepositoryRef,
        branch: Option<&str>,
    ) -> MigrationResult;

    /// Runs the configured release migrations when a release was published.
    async fn handle_release_event(&self, event: &ReleaseEvent) -> MigrationResult;

    fn has_migration(&self, name: &str) -> bool;
}

/// Builds a hosting API client for a token.
pub trait ClientFactory: Send + Sync {
    fn create(&self, token: &SecretString) -> CoreResult<Arc<dyn RepositoryClient>>;
}

/// [`ClientFactory`] producing octocrab-backed [`GitHubClient`]s.
#[derive(Debug, Default, Clone)]
pub struct GitHubClientFactory;

impl ClientFactory for GitHubClientFactory {
    fn create(&self, token: &SecretString) -> CoreResult<Arc<dyn RepositoryClient>> {
        let octocrab = create_token_client(token.expose_secret())?;
        Ok(Arc::new(GitHubClient::new(octocrab)))
    }
}

/// The production [`MigrationService`].
pub struct MigrationDispatcher {
    registry: MigrationRegistry,
    token_provider: Arc<dyn TokenProvider>,
    client_factory: Arc<dyn ClientFactory>,
    source_control: Arc<dyn SourceControl>,
    package_registry: Arc<dyn PackageRegistry>,
    settings: Arc<MigrationSettings>,
    metrics: Arc<dyn MigrationMetrics>,
}

impl MigrationDispatcher {
    pub fn new(
        registry: MigrationRegistry,
        token_provider: Arc<dyn TokenProvider>,
        client_factory: Arc<dyn ClientFactory>,
        source_control: Arc<dyn SourceControl>,
        package_registry: Arc<dyn PackageRegistry>,
        settings: Arc<MigrationSettings>,
        metrics: Arc<dyn MigrationMetrics>,
    ) -> Self {
        Self {
            registry,
            token_provider,
            client_factory,
            source_control,
            package_registry,
            settings,
            metrics,
        }
    }

    pub fn migration_names(&self) -> Vec<&'static str> {
        self.registry.names()
    }

    async fn connect(
        &self,
        repository: &RepositoryRef,
    ) -> CoreResult<(SecretString, Arc<dyn RepositoryClient>)> {
        let token = self.token_provider.token_for_owner(repository.owner()).await?;
        let client = self.client_factory.create(&token)?;
        Ok((token, client))
    }

    fn record(&self, name: &str, result: &MigrationResult, started: Instant) {
        let outcome = if result.is_error() {
            RunOutcome::Failed
        } else if result.is_noop() {
            RunOutcome::NoChange
        } else {
            RunOutcome::Proposed
        };
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.metrics.record_run(name, outcome, duration_ms);
        info!(
            migration = name,
            outcome = outcome.as_str(),
            status_code = result.status_code(),
            duration_ms,
            "Migration finished"
        );
    }
}

#[async_trait]
impl MigrationService for MigrationDispatcher {
    #[instrument(skip(self, parameters), fields(repository = %repository))]
    async fn run_migration(
        &self,
        name: &str,
        repository: &RepositoryRef,
        parameters: &MigrationParameters,
    ) -> MigrationResult {
        let Some(migration) = self.registry.get(name) else {
            warn!(migration = name, "Unknown migration requested");
            return MigrationResult::failure(
                ErrorCode::UnknownMigration,
                format!("Unknown migration '{}'", name),
            );
        };

        let started = Instant::now();
        let result = match self.connect(repository).await {
            Ok((token, client)) => {
                MigrationPipeline::new(
                    client.as_ref(),
                    self.source_control.as_ref(),
                    self.package_registry.as_ref(),
                    &self.settings,
                    &token,
                )
                .run(migration.as_ref(), repository, parameters)
                .await
            }
            Err(e) => {
                warn!("Failed to connect to '{}': {}", repository, e);
                MigrationResult::from_error(&e, migration.error_code())
            }
        };

        self.record(name, &result, started);
        result
    }

    #[instrument(skip(self), fields(repository = %repository))]
    async fn modernize_branch_protection(
        &self,
        repository: &RepositoryRef,
        branch: Option<&str>,
    ) -> MigrationResult {
        let started = Instant::now();
        let result = match self.connect(repository).await {
            Ok((_, client)) => {
                modernize_branch_protection(client.as_ref(), repository, branch).await
            }
            Err(e) => {
                warn!("Failed to connect to '{}': {}", repository, e);
                MigrationResult::from_error(&e, ErrorCode::ModernizeBranchProtectionFailed)
            }
        };

        self.record(MODERNIZE_BRANCH_PROTECTION, &result, started);
        result
    }

    #[instrument(skip(self, event), fields(action = event.action.as_str(), repository = event.repository.full_name.as_str()))]
    async fn handle_release_event(&self, event: &ReleaseEvent) -> MigrationResult {
        if event.action != RELEASE_PUBLISHED {
            info!("Ignoring release event");
            return MigrationResult::empty();
        }

        let repository = match RepositoryRef::parse(&event.repository.full_name) {
            Ok(repository) => repository,
            Err(e) => return e.into(),
        };

        let parameters = MigrationParameters::default();
        let mut results = Vec::with_capacity(self.settings.release_migrations.len());
        for name in &self.settings.release_migrations {
            let result = self.run_migration(name, &repository, &parameters).await;
            let failed = result.is_error();
            results.push(result);
            if failed {
                warn!(migration = name.as_str(), "Release migration failed, skipping the rest");
                break;
            }
        }
        MigrationResult::aggregate(results)
    }

    fn has_migration(&self, name: &str) -> bool {
        self.registry.contains(name)
    }
}
