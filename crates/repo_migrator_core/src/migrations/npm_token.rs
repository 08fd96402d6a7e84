//! `remove-npm-token`: drops the long-lived npm token from workflows.

use async_trait::async_trait;

use crate::errors::{CoreResult, ErrorCode};
use crate::migration::{
    BranchNaming, FileTransform, Migration, MigrationContext, Proposal, Scope, TextTransform,
    WORKFLOWS,
};
use crate::transforms::remove_npm_token;

#[derive(Debug, Default, Clone, Copy)]
pub struct RemoveNpmToken;

#[async_trait]
impl Migration for RemoveNpmToken {
    fn name(&self) -> &'static str {
        "remove-npm-token"
    }

    fn scopes(&self) -> Vec<Scope> {
        vec![WORKFLOWS]
    }

    fn error_code(&self) -> ErrorCode {
        ErrorCode::RemoveNpmTokenFailed
    }

    fn proposal(&self) -> Proposal {
        Proposal::new(
            BranchNaming::Timestamped("remove-npm-token"),
            "ci: remove NPM_TOKEN from workflows",
            "Remove NPM_TOKEN",
            "Publishing uses OIDC trusted publishing, so the `NPM_TOKEN` secret is no longer \
             passed to workflows.",
        )
    }

    async fn prepare(&self, _context: &MigrationContext<'_>) -> CoreResult<Box<dyn FileTransform>> {
        Ok(Box::new(TextTransform::infallible(remove_npm_token)))
    }
}
