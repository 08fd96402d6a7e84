//! `update-runner-os`: bumps runner image labels in workflows.

use async_trait::async_trait;

use crate::errors::{CoreResult, ErrorCode};
use crate::migration::{
    BranchNaming, FileTransform, Migration, MigrationContext, Proposal, Scope, TextTransform,
    WORKFLOWS,
};
use crate::transforms::update_runner_os;

#[derive(Debug, Default, Clone, Copy)]
pub struct UpdateRunnerOs;

#[async_trait]
impl Migration for UpdateRunnerOs {
    fn name(&self) -> &'static str {
        "update-runner-os"
    }

    fn scopes(&self) -> Vec<Scope> {
        vec![WORKFLOWS]
    }

    fn error_code(&self) -> ErrorCode {
        ErrorCode::UpdateRunnerOsFailed
    }

    fn proposal(&self) -> Proposal {
        Proposal::new(
            BranchNaming::Timestamped("update-runner-os"),
            "ci: update runner operating systems",
            "Update runner operating systems",
            "Moves workflow runner labels to the currently supported image versions.",
        )
    }

    async fn prepare(&self, context: &MigrationContext<'_>) -> CoreResult<Box<dyn FileTransform>> {
        let os_versions = context.settings.os_versions.clone();
        Ok(Box::new(TextTransform::infallible(move |content| {
            update_runner_os(content, &os_versions)
        })))
    }
}
