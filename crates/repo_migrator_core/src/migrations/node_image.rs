//! `update-node-image`: moves Dockerfile base images to the configured Node version.

use async_trait::async_trait;

use crate::errors::{CoreResult, ErrorCode};
use crate::migration::{
    BranchNaming, FileTransform, Migration, MigrationContext, Proposal, Scope, TextTransform,
};
use crate::transforms::dockerfile::DOCKERFILE;
use crate::transforms::update_node_image;

#[derive(Debug, Default, Clone, Copy)]
pub struct UpdateNodeImage;

#[async_trait]
impl Migration for UpdateNodeImage {
    fn name(&self) -> &'static str {
        "update-node-image"
    }

    fn scopes(&self) -> Vec<Scope> {
        vec![Scope::File(DOCKERFILE)]
    }

    fn error_code(&self) -> ErrorCode {
        ErrorCode::UpdateNodeImageFailed
    }

    fn proposal(&self) -> Proposal {
        Proposal::new(
            BranchNaming::Timestamped("update-node-image"),
            "build: update Node.js base image",
            "Update Node.js base image",
            "Moves the Dockerfile base image to the supported Node.js version.",
        )
    }

    async fn prepare(&self, context: &MigrationContext<'_>) -> CoreResult<Box<dyn FileTransform>> {
        let version = context.settings.node_image_version.clone();
        Ok(Box::new(TextTransform::infallible(move |content| {
            update_node_image(content, &version)
        })))
    }
}
