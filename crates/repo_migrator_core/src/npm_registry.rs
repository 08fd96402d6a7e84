//! Latest-version lookups against an npm registry.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, instrument};
use url::Url;

use crate::errors::{CoreResult, MigrationError};

#[cfg(test)]
#[path = "npm_registry_tests.rs"]
mod tests;

/// Source of published package versions.
#[async_trait]
pub trait PackageRegistry: Send + Sync {
    /// Returns the version tagged `latest`, e.g. `"5.3.1"`.
    ///
    /// An unpublished package is `DependencyNotFound`.
    async fn latest_version(&self, package: &str) -> CoreResult<String>;
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    version: String,
}

/// [`PackageRegistry`] speaking the npm registry HTTP API.
#[derive(Debug, Clone)]
pub struct NpmRegistryClient {
    client: reqwest::Client,
    base_url: Url,
}

impl NpmRegistryClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn manifest_url(&self, package: &str) -> String {
        // Scoped names keep the `@` but encode the separator.
        format!(
            "{}/{}/latest",
            self.base_url.as_str().trim_end_matches('/'),
            package.replace('/', "%2F")
        )
    }
}

#[async_trait]
impl PackageRegistry for NpmRegistryClient {
    #[instrument(skip(self))]
    async fn latest_version(&self, package: &str) -> CoreResult<String> {
        let url = self.manifest_url(package);
        debug!("Looking up latest version at {}", url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                error!("Registry request for '{}' failed: {}", package, e);
                MigrationError::Registry(format!("Request for '{}' failed: {}", package, e))
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(MigrationError::DependencyNotFound(package.to_string()));
        }
        if !status.is_success() {
            error!("Registry returned {} for '{}'", status, package);
            return Err(MigrationError::Registry(format!(
                "Registry returned {} for '{}'",
                status, package
            )));
        }

        let manifest: PackageManifest = response.json().await.map_err(|e| {
            MigrationError::Registry(format!("Invalid manifest for '{}': {}", package, e))
        })?;

        Ok(manifest.version)
    }
}
