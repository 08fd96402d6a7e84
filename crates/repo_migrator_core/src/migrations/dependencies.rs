//! `update-dependencies`: bumps package.json dependencies to the configured versions.
//!
//! Runs on a shallow clone of the repository. Versions configured as `latest` are looked up
//! in the package registry, all lookups of one run concurrently.

use std::collections::BTreeMap;

use async_trait::async_trait;
use config_manager::{is_latest, LATEST};
use futures::future::try_join_all;
use tracing::{debug, instrument};

use crate::errors::{CoreResult, ErrorCode, MigrationError};
use crate::migration::{
    Acquisition, BranchNaming, FileTransform, Migration, MigrationContext, Proposal, Scope,
    TextTransform,
};
use crate::npm_registry::PackageRegistry;
use crate::transforms::package_json::PACKAGE_JSON;
use crate::transforms::update_dependencies;

#[cfg(test)]
#[path = "dependencies_tests.rs"]
mod tests;

#[derive(Debug, Default, Clone, Copy)]
pub struct UpdateDependencies;

#[async_trait]
impl Migration for UpdateDependencies {
    fn name(&self) -> &'static str {
        "update-dependencies"
    }

    fn scopes(&self) -> Vec<Scope> {
        vec![Scope::File(PACKAGE_JSON)]
    }

    fn acquisition(&self) -> Acquisition {
        Acquisition::Clone
    }

    fn error_code(&self) -> ErrorCode {
        ErrorCode::UpdateDependenciesFailed
    }

    fn proposal(&self) -> Proposal {
        Proposal::new(
            BranchNaming::Timestamped("update-dependencies"),
            "chore(deps): update dependencies",
            "Update dependencies",
            "Moves the dependencies in package.json to their current versions.",
        )
    }

    async fn prepare(&self, context: &MigrationContext<'_>) -> CoreResult<Box<dyn FileTransform>> {
        let only = context.parameters.dependency.clone();
        let wanted = match &only {
            Some(name) => {
                let version = context
                    .settings
                    .dependencies
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| LATEST.to_string());
                BTreeMap::from([(name.clone(), version)])
            }
            None => context.settings.dependencies.clone(),
        };

        let versions = resolve_versions(context.package_registry, &wanted).await?;
        Ok(Box::new(TextTransform::new(move |_, content| {
            update_dependencies(content, &versions, only.as_deref())
        })))
    }
}

/// Resolves every `latest` entry through `registry`; other entries are kept as configured.
#[instrument(skip(registry, wanted), fields(packages = wanted.len()))]
pub(crate) async fn resolve_versions(
    registry: &dyn PackageRegistry,
    wanted: &BTreeMap<String, String>,
) -> CoreResult<BTreeMap<String, String>> {
    let lookups = wanted.iter().map(|(name, version)| async move {
        if is_latest(version) {
            let latest = registry.latest_version(name).await?;
            debug!(package = name.as_str(), version = latest.as_str(), "Resolved latest version");
            Ok::<_, MigrationError>((name.clone(), latest))
        } else {
            Ok((name.clone(), version.clone()))
        }
    });

    Ok(try_join_all(lookups).await?.into_iter().collect())
}
