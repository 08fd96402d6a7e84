//! `add-oidc-permissions`: lets publishing workflows request an OIDC token.

use async_trait::async_trait;

use crate::errors::{CoreResult, ErrorCode};
use crate::migration::{
    BranchNaming, FileTransform, Migration, MigrationContext, Proposal, Scope, TextTransform,
    WORKFLOWS,
};
use crate::transforms::add_oidc_permissions;

#[derive(Debug, Default, Clone, Copy)]
pub struct AddOidcPermissions;

#[async_trait]
impl Migration for AddOidcPermissions {
    fn name(&self) -> &'static str {
        "add-oidc-permissions"
    }

    fn scopes(&self) -> Vec<Scope> {
        vec![WORKFLOWS]
    }

    fn error_code(&self) -> ErrorCode {
        ErrorCode::AddOidcPermissionsFailed
    }

    fn proposal(&self) -> Proposal {
        Proposal::new(
            BranchNaming::Timestamped("add-oidc-permissions"),
            "ci: grant id-token permission to publishing workflows",
            "Add OIDC permissions for npm publishing",
            "Grants `id-token: write` to workflows that run `npm publish` so packages can be \
             published with trusted publishing and provenance.",
        )
    }

    async fn prepare(&self, _context: &MigrationContext<'_>) -> CoreResult<Box<dyn FileTransform>> {
        Ok(Box::new(TextTransform::infallible(add_oidc_permissions)))
    }
}
