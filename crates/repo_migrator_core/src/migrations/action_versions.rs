//! `update-action-versions`: moves `uses:` references to the configured major versions.
//!
//! A configured version of `latest` is resolved through the action repository's latest
//! release, falling back to its newest `v`-tag.

use std::collections::BTreeMap;

use async_trait::async_trait;
use config_manager::is_latest;
use github_client::RepositoryClient;
use tracing::{debug, instrument, warn};

use crate::errors::{CoreResult, ErrorCode};
use crate::migration::{
    BranchNaming, FileTransform, Migration, MigrationContext, Proposal, Scope, TextTransform,
    WORKFLOWS,
};
use crate::transforms::update_action_versions;

#[cfg(test)]
#[path = "action_versions_tests.rs"]
mod tests;

#[derive(Debug, Default, Clone, Copy)]
pub struct UpdateActionVersions;

#[async_trait]
impl Migration for UpdateActionVersions {
    fn name(&self) -> &'static str {
        "update-action-versions"
    }

    fn scopes(&self) -> Vec<Scope> {
        vec![WORKFLOWS]
    }

    fn error_code(&self) -> ErrorCode {
        ErrorCode::UpdateActionVersionsFailed
    }

    fn proposal(&self) -> Proposal {
        Proposal::new(
            BranchNaming::Timestamped("update-action-versions"),
            "ci: update GitHub Actions versions",
            "Update GitHub Actions versions",
            "Moves the actions used by the workflows to their current major versions.",
        )
    }

    async fn prepare(&self, context: &MigrationContext<'_>) -> CoreResult<Box<dyn FileTransform>> {
        let versions = resolve_action_versions(context.client, &context.settings.action_versions)
            .await?;
        Ok(Box::new(TextTransform::infallible(move |content| {
            update_action_versions(content, &versions)
        })))
    }
}

/// Replaces every `latest` entry of `configured` with the major tag (`vN`) of the action's
/// newest release.
///
/// Actions without any release or `v`-tag are dropped from the table so their references
/// stay as they are.
#[instrument(skip(client, configured))]
pub(crate) async fn resolve_action_versions(
    client: &dyn RepositoryClient,
    configured: &BTreeMap<String, String>,
) -> CoreResult<BTreeMap<String, String>> {
    let mut resolved = BTreeMap::new();
    for (action, version) in configured {
        if !is_latest(version) {
            resolved.insert(action.clone(), version.clone());
            continue;
        }

        let mut segments = action.split('/');
        let (Some(owner), Some(repo)) = (segments.next(), segments.next()) else {
            warn!(action = action.as_str(), "Action name is not 'owner/repo', skipping");
            continue;
        };

        match latest_major(client, owner, repo).await? {
            Some(major) => {
                debug!(action = action.as_str(), major = major.as_str(), "Resolved latest action version");
                resolved.insert(action.clone(), major);
            }
            None => warn!(action = action.as_str(), "No release or version tag found, skipping"),
        }
    }
    Ok(resolved)
}

async fn latest_major(
    client: &dyn RepositoryClient,
    owner: &str,
    repo: &str,
) -> CoreResult<Option<String>> {
    if let Some(release) = client.get_latest_release(owner, repo).await? {
        if let Some(major) = major_tag(&release.tag_name) {
            return Ok(Some(major));
        }
    }

    let tags = client.list_tags(owner, repo).await?;
    Ok(tags.iter().find_map(|tag| {
        tag.name
            .starts_with('v')
            .then(|| major_tag(&tag.name))
            .flatten()
    }))
}

/// `v4.2.1` and `4.2.1` both give `v4`.
pub(crate) fn major_tag(tag: &str) -> Option<String> {
    let digits = tag.strip_prefix('v').unwrap_or(tag);
    let major = digits.split('.').next()?;
    major.parse::<u64>().ok().map(|major| format!("v{}", major))
}
