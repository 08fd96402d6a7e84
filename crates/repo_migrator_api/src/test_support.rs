//! Shared fixtures for the API tests.

use std::sync::Arc;

use async_trait::async_trait;
use prometheus::Registry;
use repo_migrator_core::{
    MigrationParameters, MigrationResult, MigrationService, ReleaseEvent, RepositoryRef,
};
use secrecy::SecretString;

use crate::AppState;

pub(crate) const TEST_SECRET: &str = "s3cret";

/// Service that reports "no changes" for every request.
pub(crate) struct NoChangeService;

#[async_trait]
impl MigrationService for NoChangeService {
    async fn run_migration(
        &self,
        _name: &str,
        _repository: &RepositoryRef,
        _parameters: &MigrationParameters,
    ) -> MigrationResult {
        MigrationResult::empty()
    }

    async fn modernize_branch_protection(
        &self,
        _repository: &RepositoryRef,
        _branch: Option<&str>,
    ) -> MigrationResult {
        MigrationResult::empty()
    }

    async fn handle_release_event(&self, _event: &ReleaseEvent) -> MigrationResult {
        MigrationResult::empty()
    }

    fn has_migration(&self, name: &str) -> bool {
        name == "remove-npm-token"
    }
}

pub(crate) fn test_state() -> AppState {
    AppState::new(
        Arc::new(NoChangeService),
        SecretString::from(TEST_SECRET.to_string()),
        Registry::new(),
    )
}
