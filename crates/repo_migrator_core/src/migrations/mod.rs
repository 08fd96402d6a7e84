//! The registered migrations.

use std::sync::Arc;

use crate::migration::MigrationRegistry;

pub mod action_versions;
pub mod composite;
pub mod dependencies;
pub mod lint_script;
pub mod node_image;
pub mod npm_token;
pub mod oidc_permissions;
pub mod runner_os;

pub use action_versions::UpdateActionVersions;
pub use composite::CompositeMigration;
pub use dependencies::UpdateDependencies;
pub use lint_script::AddLintScript;
pub use node_image::UpdateNodeImage;
pub use npm_token::RemoveNpmToken;
pub use oidc_permissions::AddOidcPermissions;
pub use runner_os::UpdateRunnerOs;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

/// A registry holding every built-in migration.
pub fn default_registry() -> MigrationRegistry {
    let mut registry = MigrationRegistry::new();
    registry.register(Arc::new(UpdateRunnerOs));
    registry.register(Arc::new(UpdateActionVersions));
    registry.register(Arc::new(AddOidcPermissions));
    registry.register(Arc::new(RemoveNpmToken));
    registry.register(Arc::new(UpdateDependencies));
    registry.register(Arc::new(AddLintScript));
    registry.register(Arc::new(UpdateNodeImage));
    registry.register(Arc::new(CompositeMigration::update_github_actions()));
    registry
}
