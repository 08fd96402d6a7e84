//! # Repo Migrator Core
//!
//! Automated repository migrations. Each migration inspects a narrow set of files in a GitHub
//! repository (workflow YAML, `package.json`, `Dockerfile`), applies a pure transformation
//! and, when something changed, proposes the change as a pull request.
//!
//! ## Overview
//!
//! A run goes through the same steps for every migration:
//! 1. Resolve a token for the repository owner and build a hosting client
//! 2. Acquire the scoped files, through the contents API or a shallow clone
//! 3. Apply the migration's transform and detect what changed
//! 4. Create a branch, commit the changed files and open a pull request
//! 5. Optionally enable squash auto-merge
//!
//! Every outcome, including failures, is a [`MigrationResult`] whose HTTP-style status code
//! is derived from its fields.
//!
//! ## Main Types
//!
//! - [`MigrationDispatcher`] - runs migrations by name and handles release events
//! - [`MigrationPipeline`] - the acquire, transform, diff and propose pipeline
//! - [`Migration`] - one registered migration; see [`migrations::default_registry`]
//! - [`modernize_branch_protection`] - replaces classic branch protection with a ruleset
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use auth_handler::StaticTokenProvider;
//! use config_manager::MigrationSettings;
//! use prometheus::Registry;
//! use repo_migrator_core::{
//!     migrations::default_registry, Git2SourceControl, GitHubClientFactory,
//!     MigrationDispatcher, MigrationParameters, MigrationService, NpmRegistryClient,
//!     PrometheusMigrationMetrics, RepositoryRef,
//! };
//! use secrecy::SecretString;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = MigrationSettings::default();
//! let metrics = PrometheusMigrationMetrics::new(&Registry::new())?;
//! let dispatcher = MigrationDispatcher::new(
//!     default_registry(),
//!     Arc::new(StaticTokenProvider::new(SecretString::from("ghp_example".to_string()))),
//!     Arc::new(GitHubClientFactory),
//!     Arc::new(Git2SourceControl::new()),
//!     Arc::new(NpmRegistryClient::new(settings.npm_registry_url.parse()?)),
//!     Arc::new(settings),
//!     Arc::new(metrics),
//! );
//!
//! let repository = RepositoryRef::parse("octo/widgets")?;
//! let result = dispatcher
//!     .run_migration("remove-npm-token", &repository, &MigrationParameters::default())
//!     .await;
//! println!("{}: {:?}", result.status_code(), result.branch_name());
//! # Ok(())
//! # }
//! ```

pub mod branch_protection;
pub mod changeset;
pub mod dispatcher;
pub mod errors;
pub mod git;
pub mod metrics;
pub mod migration;
pub mod migrations;
pub mod npm_registry;
pub mod pipeline;
pub mod protection_migration;
pub mod repository;
pub mod result;
pub mod transforms;
pub mod webhook_signature;

#[cfg(test)]
mod test_support;

pub use branch_protection::{convert, convert_json, default_ruleset, ruleset_name};
pub use changeset::{
    compute_changed, default_status_filter, normalize_path, parse_status, ParsedStatusEntry,
    StatusFilter,
};
pub use dispatcher::{
    ClientFactory, GitHubClientFactory, MigrationDispatcher, MigrationService, ReleaseEvent,
    ReleaseRepository,
};
pub use errors::{CoreResult, ErrorCode, MigrationError, ValidationError};
pub use git::{Git2SourceControl, SourceControl, Workspace};
pub use metrics::{MigrationMetrics, NoOpMigrationMetrics, PrometheusMigrationMetrics, RunOutcome};
pub use migration::{
    Acquisition, BranchNaming, FileSet, FileTransform, Migration, MigrationContext,
    MigrationParameters, MigrationRegistry, Proposal, Scope,
};
pub use npm_registry::{NpmRegistryClient, PackageRegistry};
pub use pipeline::MigrationPipeline;
pub use protection_migration::modernize_branch_protection;
pub use repository::{OwnerName, RepositoryName, RepositoryRef};
pub use result::{
    status_code_for, ChangeKind, ChangedFile, MigrationResult, MigrationStatus, PullRequestInfo,
};
pub use webhook_signature::{compute_signature, verify_signature, SIGNATURE_HEADER};
