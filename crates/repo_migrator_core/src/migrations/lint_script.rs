//! `add-lint-script`: adds `scripts.lint` to package.json.

use async_trait::async_trait;

use crate::errors::{CoreResult, ErrorCode};
use crate::migration::{
    BranchNaming, FileTransform, Migration, MigrationContext, Proposal, Scope, TextTransform,
};
use crate::transforms::add_lint_script;
use crate::transforms::package_json::PACKAGE_JSON;

#[derive(Debug, Default, Clone, Copy)]
pub struct AddLintScript;

#[async_trait]
impl Migration for AddLintScript {
    fn name(&self) -> &'static str {
        "add-lint-script"
    }

    fn scopes(&self) -> Vec<Scope> {
        vec![Scope::File(PACKAGE_JSON)]
    }

    fn error_code(&self) -> ErrorCode {
        ErrorCode::AddEslintFailed
    }

    fn proposal(&self) -> Proposal {
        Proposal::new(
            BranchNaming::Fixed("feature/add-lint-script"),
            "chore: add lint script",
            "Add lint script",
            "Adds a `lint` script to package.json.",
        )
    }

    async fn prepare(&self, context: &MigrationContext<'_>) -> CoreResult<Box<dyn FileTransform>> {
        let script = context.settings.lint_script.clone();
        Ok(Box::new(TextTransform::new(move |_, content| {
            add_lint_script(content, &script)
        })))
    }
}
