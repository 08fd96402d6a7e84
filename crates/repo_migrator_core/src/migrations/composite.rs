//! Migrations made of other migrations, proposed as one pull request.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::{CoreResult, ErrorCode};
use crate::migration::{
    Acquisition, BranchNaming, ChainedTransform, FileTransform, Migration, MigrationContext,
    Proposal, Scope,
};

use super::{UpdateActionVersions, UpdateRunnerOs};

#[cfg(test)]
#[path = "composite_tests.rs"]
mod tests;

/// Runs its members' transforms in order on one file set.
///
/// The scope is the union of the members' scopes. Members must all fetch remotely.
pub struct CompositeMigration {
    name: &'static str,
    members: Vec<Arc<dyn Migration>>,
    error_code: ErrorCode,
    proposal: Proposal,
}

impl CompositeMigration {
    pub fn new(
        name: &'static str,
        members: Vec<Arc<dyn Migration>>,
        error_code: ErrorCode,
        proposal: Proposal,
    ) -> Self {
        Self {
            name,
            members,
            error_code,
            proposal,
        }
    }

    /// `update-github-actions`: runner images, then action versions.
    pub fn update_github_actions() -> Self {
        Self::new(
            "update-github-actions",
            vec![Arc::new(UpdateRunnerOs), Arc::new(UpdateActionVersions)],
            ErrorCode::UpdateGithubActionsFailed,
            Proposal::new(
                BranchNaming::Timestamped("update-github-actions"),
                "ci: update GitHub Actions",
                "Update GitHub Actions",
                "Moves workflow runner images and the actions used by the workflows to their \
                 current versions.",
            ),
        )
    }

    pub fn member_names(&self) -> Vec<&'static str> {
        self.members.iter().map(|m| m.name()).collect()
    }
}

#[async_trait]
impl Migration for CompositeMigration {
    fn name(&self) -> &'static str {
        self.name
    }

    fn scopes(&self) -> Vec<Scope> {
        let mut scopes: Vec<Scope> = Vec::new();
        for scope in self.members.iter().flat_map(|m| m.scopes()) {
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }
        scopes
    }

    fn acquisition(&self) -> Acquisition {
        Acquisition::Remote
    }

    fn error_code(&self) -> ErrorCode {
        self.error_code
    }

    fn proposal(&self) -> Proposal {
        self.proposal.clone()
    }

    async fn prepare(&self, context: &MigrationContext<'_>) -> CoreResult<Box<dyn FileTransform>> {
        let mut transforms = Vec::with_capacity(self.members.len());
        for member in &self.members {
            transforms.push(member.prepare(context).await?);
        }
        Ok(Box::new(ChainedTransform::new(transforms)))
    }
}
