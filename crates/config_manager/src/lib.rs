//! Configuration management for the repository migrator
//!
//! Provides [`MigrationSettings`], the version tables and switches every migration reads,
//! and the loading and validation of those settings from TOML or JSON files.

pub mod errors;
pub mod migration_settings;

pub use errors::{ConfigurationError, ConfigurationResult};
pub use migration_settings::{
    is_latest, MigrationSettings, PullRequestSettings, DEFAULT_NPM_REGISTRY_URL, LATEST,
    SUPPORTED_RUNNER_OS,
};
