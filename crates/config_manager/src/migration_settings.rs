//! Version tables and behaviour switches shared by all migrations.
//!
//! The settings are loaded once at startup and then shared read-only. Every field has a
//! default so a configuration file only needs to list what it changes.
//!
//! # TOML Format
//!
//! ```toml
//! node_image_version = "22"
//! lint_script = "eslint ."
//! release_migrations = ["update-github-actions"]
//!
//! [os_versions]
//! ubuntu = "24.04"
//! macos = "15"
//!
//! [action_versions]
//! "actions/checkout" = "v4"
//! "actions/setup-node" = "latest"
//!
//! [dependencies]
//! typescript = "latest"
//!
//! [pull_requests]
//! auto_merge = true
//! ```

use crate::errors::{ConfigurationError, ConfigurationResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, instrument};
use url::Url;

#[cfg(test)]
#[path = "migration_settings_tests.rs"]
mod tests;

/// Version value that is resolved at run time to the newest published version.
pub const LATEST: &str = "latest";

pub const DEFAULT_NPM_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Runner operating systems whose labels can be bumped.
pub const SUPPORTED_RUNNER_OS: [&str; 3] = ["ubuntu", "windows", "macos"];

/// Settings for all migrations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationSettings {
    /// Target runner image version per OS family, e.g. `ubuntu = "24.04"`.
    pub os_versions: BTreeMap<String, String>,

    /// Target major version per action, e.g. `"actions/checkout" = "v4"` or `latest`.
    pub action_versions: BTreeMap<String, String>,

    /// Target version per npm package, either an exact version or `latest`.
    pub dependencies: BTreeMap<String, String>,

    /// Node version used for `FROM node:<version>` in Dockerfiles.
    pub node_image_version: String,

    /// Command added as `scripts.lint` to package.json.
    pub lint_script: String,

    pub pull_requests: PullRequestSettings,

    /// Migrations run when a release is published.
    pub release_migrations: Vec<String>,

    pub npm_registry_url: String,
}

/// Settings for the pull requests the migrations open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PullRequestSettings {
    /// Enable squash auto-merge on every opened pull request.
    pub auto_merge: bool,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        let os_versions = [("ubuntu", "24.04"), ("windows", "2025"), ("macos", "15")];
        let action_versions = [
            ("actions/cache", "v4"),
            ("actions/checkout", "v4"),
            ("actions/download-artifact", "v4"),
            ("actions/setup-node", "v4"),
            ("actions/upload-artifact", "v4"),
        ];

        Self {
            os_versions: to_table(&os_versions),
            action_versions: to_table(&action_versions),
            dependencies: BTreeMap::new(),
            node_image_version: "22".to_string(),
            lint_script: "eslint .".to_string(),
            pull_requests: PullRequestSettings::default(),
            release_migrations: vec!["update-github-actions".to_string()],
            npm_registry_url: DEFAULT_NPM_REGISTRY_URL.to_string(),
        }
    }
}

fn to_table(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl MigrationSettings {
    /// Loads and validates settings from a TOML file, or a JSON file when the extension
    /// is `.json`.
    ///
    /// # Errors
    ///
    /// * `FileNotFound` if the file does not exist
    /// * `FileAccessError` if it cannot be read
    /// * `ParseError` if the content is not valid TOML/JSON for these settings
    /// * `InvalidConfiguration` if validation fails
    #[instrument(fields(path = %path.display()))]
    pub fn load(path: &Path) -> ConfigurationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigurationError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => ConfigurationError::FileAccessError {
                path: path.display().to_string(),
                reason: e.to_string(),
            },
        })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let settings = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };

        info!(
            actions = settings.action_versions.len(),
            dependencies = settings.dependencies.len(),
            "Loaded migration settings"
        );
        Ok(settings)
    }

    /// Parses and validates settings from TOML text.
    pub fn from_toml_str(content: &str) -> ConfigurationResult<Self> {
        let settings: Self = toml::from_str(content).map_err(|e| ConfigurationError::ParseError {
            reason: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parses and validates settings from JSON text.
    pub fn from_json_str(content: &str) -> ConfigurationResult<Self> {
        let settings: Self =
            serde_json::from_str(content).map_err(|e| ConfigurationError::ParseError {
                reason: e.to_string(),
            })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks that every configured version is usable.
    pub fn validate(&self) -> ConfigurationResult<()> {
        for (os, version) in &self.os_versions {
            if !SUPPORTED_RUNNER_OS.contains(&os.as_str()) {
                return Err(ConfigurationError::invalid(
                    format!("os_versions.{}", os),
                    format!("Unsupported runner OS, expected one of {:?}", SUPPORTED_RUNNER_OS),
                ));
            }
            if version.is_empty() || !version.chars().all(|c| c.is_ascii_digit() || c == '.') {
                return Err(ConfigurationError::invalid(
                    format!("os_versions.{}", os),
                    format!("'{}' is not a numeric runner version", version),
                ));
            }
        }

        for (action, version) in &self.action_versions {
            if action.split('/').count() != 2 || action.split('/').any(str::is_empty) {
                return Err(ConfigurationError::invalid(
                    format!("action_versions.{}", action),
                    "Action must be written as owner/name",
                ));
            }
            if !is_latest(version) && !is_major_tag(version) {
                return Err(ConfigurationError::invalid(
                    format!("action_versions.{}", action),
                    format!("'{}' must be 'latest' or a major tag like v4", version),
                ));
            }
        }

        for (package, version) in &self.dependencies {
            if version.trim().is_empty() {
                return Err(ConfigurationError::invalid(
                    format!("dependencies.{}", package),
                    "Version must not be empty",
                ));
            }
        }

        if self.node_image_version.trim().is_empty() {
            return Err(ConfigurationError::invalid(
                "node_image_version",
                "Version must not be empty",
            ));
        }

        if self.lint_script.trim().is_empty() {
            return Err(ConfigurationError::invalid(
                "lint_script",
                "Script must not be empty",
            ));
        }

        if self.release_migrations.iter().any(|m| m.trim().is_empty()) {
            return Err(ConfigurationError::invalid(
                "release_migrations",
                "Migration names must not be empty",
            ));
        }

        let registry = Url::parse(&self.npm_registry_url).map_err(|e| {
            ConfigurationError::invalid("npm_registry_url", e.to_string())
        })?;
        if registry.scheme() != "https" && registry.scheme() != "http" {
            return Err(ConfigurationError::invalid(
                "npm_registry_url",
                "Registry URL must use http or https",
            ));
        }

        Ok(())
    }
}

/// Returns true for `latest`, case-insensitively.
pub fn is_latest(version: &str) -> bool {
    version.eq_ignore_ascii_case(LATEST)
}

fn is_major_tag(version: &str) -> bool {
    version
        .strip_prefix('v')
        .map(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}
