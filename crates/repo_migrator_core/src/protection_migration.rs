//! Replacing classic branch protection with a ruleset.

use github_client::{RepositoryClient, RepositoryRuleset};
use tracing::{error, info, instrument, warn};

use crate::branch_protection::{convert, default_ruleset};
use crate::errors::{CoreResult, ErrorCode};
use crate::repository::RepositoryRef;
use crate::result::MigrationResult;

#[cfg(test)]
#[path = "protection_migration_tests.rs"]
mod tests;

/// Moves the protection of the default branch from the classic configuration to a ruleset.
///
/// `branch` defaults to the repository default branch; naming any other branch is a
/// validation error because the created ruleset targets `~DEFAULT_BRANCH`. When an active
/// ruleset already applies to the branch nothing is changed.
///
/// The classic protection is only deleted after the ruleset was created. A created ruleset
/// is kept even when the deletion fails.
#[instrument(skip(client), fields(owner = repository.owner(), repo = repository.name()))]
pub async fn modernize_branch_protection(
    client: &dyn RepositoryClient,
    repository: &RepositoryRef,
    branch: Option<&str>,
) -> MigrationResult {
    let owner = repository.owner();
    let repo = repository.name();

    let default_branch = match client.get_repository(owner, repo).await {
        Ok(r) => r.default_branch,
        Err(e) => {
            error!("Failed to load repository {}: {}", repository, e);
            return MigrationResult::from_error(
                &e.into(),
                ErrorCode::ModernizeBranchProtectionFailed,
            );
        }
    };

    let branch = branch.unwrap_or(&default_branch);
    if branch != default_branch {
        return MigrationResult::failure(
            ErrorCode::ValidationError,
            format!(
                "Only the default branch '{}' can be modernized, got '{}'",
                default_branch, branch
            ),
        );
    }

    match find_targeting_ruleset(client, repository, branch).await {
        Ok(Some(existing)) => {
            info!(
                "Ruleset '{}' already protects '{}', nothing to do",
                existing.name, branch
            );
            return MigrationResult::empty();
        }
        Ok(None) => {}
        Err(e) => {
            return MigrationResult::from_error(&e, ErrorCode::ModernizeBranchProtectionFailed)
        }
    }

    let classic = match client.get_branch_protection(owner, repo, branch).await {
        Ok(classic) => classic,
        Err(e) => {
            return MigrationResult::from_error(
                &e.into(),
                ErrorCode::ModernizeBranchProtectionFailed,
            )
        }
    };

    let ruleset = match &classic {
        Some(classic) => convert(classic, branch),
        None => {
            info!("Branch '{}' has no classic protection, using default ruleset", branch);
            default_ruleset(branch)
        }
    };

    let created = match client.create_ruleset(owner, repo, &ruleset).await {
        Ok(created) => created,
        Err(e) => {
            error!("Failed to create ruleset for {}: {}", repository, e);
            return MigrationResult::from_error(&e.into(), ErrorCode::CreateRulesetFailed);
        }
    };
    info!(ruleset_id = ?created.id, "Created ruleset '{}'", created.name);

    if classic.is_some() {
        if let Err(e) = client.delete_branch_protection(owner, repo, branch).await {
            warn!(
                "Ruleset '{}' was created but the classic protection of '{}' could not be deleted: {}",
                created.name, branch, e
            );
            return MigrationResult::from_error(
                &e.into(),
                ErrorCode::DeleteClassicProtectionFailed,
            );
        }
        info!("Deleted classic protection of '{}'", branch);
    }

    MigrationResult::empty()
}

/// Returns the first active ruleset that applies to `branch`.
///
/// The list endpoint returns summaries only, so every ruleset is fetched in full.
async fn find_targeting_ruleset(
    client: &dyn RepositoryClient,
    repository: &RepositoryRef,
    branch: &str,
) -> CoreResult<Option<RepositoryRuleset>> {
    let summaries = client
        .list_rulesets(repository.owner(), repository.name())
        .await?;

    for summary in summaries {
        let Some(id) = summary.id else {
            continue;
        };
        let ruleset = client
            .get_ruleset(repository.owner(), repository.name(), id)
            .await?;
        if ruleset.targets_branch(branch, true) {
            return Ok(Some(ruleset));
        }
    }

    Ok(None)
}
