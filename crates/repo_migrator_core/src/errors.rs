//! Error types for the migration core.
//!
//! [`MigrationError`] is what the building blocks return internally. At the boundary of a
//! migration every error is converted into an error [`crate::MigrationResult`] tagged with an
//! [`ErrorCode`], so callers never see a `MigrationError` directly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Fixed taxonomy of failure tags reported in a migration result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    UpdateRunnerOsFailed,
    UpdateActionVersionsFailed,
    AddOidcPermissionsFailed,
    RemoveNpmTokenFailed,
    UpdateDependenciesFailed,
    AddEslintFailed,
    UpdateNodeImageFailed,
    UpdateGithubActionsFailed,
    DependencyNotFound,
    Forbidden,
    ValidationError,
    CreateRulesetFailed,
    DeleteClassicProtectionFailed,
    ModernizeBranchProtectionFailed,
    UnknownMigration,
    AuthenticationFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UpdateRunnerOsFailed => "UPDATE_RUNNER_OS_FAILED",
            ErrorCode::UpdateActionVersionsFailed => "UPDATE_ACTION_VERSIONS_FAILED",
            ErrorCode::AddOidcPermissionsFailed => "ADD_OIDC_PERMISSIONS_FAILED",
            ErrorCode::RemoveNpmTokenFailed => "REMOVE_NPM_TOKEN_FAILED",
            ErrorCode::UpdateDependenciesFailed => "UPDATE_DEPENDENCIES_FAILED",
            ErrorCode::AddEslintFailed => "ADD_ESLINT_FAILED",
            ErrorCode::UpdateNodeImageFailed => "UPDATE_NODE_IMAGE_FAILED",
            ErrorCode::UpdateGithubActionsFailed => "UPDATE_GITHUB_ACTIONS_FAILED",
            ErrorCode::DependencyNotFound => "DEPENDENCY_NOT_FOUND",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::CreateRulesetFailed => "CREATE_RULESET_FAILED",
            ErrorCode::DeleteClassicProtectionFailed => "DELETE_CLASSIC_PROTECTION_FAILED",
            ErrorCode::ModernizeBranchProtectionFailed => "MODERNIZE_BRANCH_PROTECTION_FAILED",
            ErrorCode::UnknownMigration => "UNKNOWN_MIGRATION",
            ErrorCode::AuthenticationFailed => "AUTHENTICATION_FAILED",
        }
    }

    /// Codes caused by the request rather than by the target repository or GitHub.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::DependencyNotFound | ErrorCode::Forbidden | ErrorCode::ValidationError
        )
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' is too long: {actual} characters (max: {max})")]
    TooLong {
        field: String,
        actual: usize,
        max: usize,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn empty_field(field: impl Into<String>) -> Self {
        Self::EmptyField {
            field: field.into(),
        }
    }

    pub fn too_long(field: impl Into<String>, actual: usize, max: usize) -> Self {
        Self::TooLong {
            field: field.into(),
            actual,
            max,
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while running a migration.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("GitHub API error: {0}")]
    GitHub(#[from] github_client::Error),

    #[error("Git operation failed: {0}")]
    GitOperation(String),

    #[error("Failed to read '{path}': {reason}")]
    FileRead { path: String, reason: String },

    #[error("Failed to write '{path}': {reason}")]
    FileWrite { path: String, reason: String },

    #[error("Failed to transform '{path}': {reason}")]
    Transform { path: String, reason: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Dependency '{0}' is not listed in package.json")]
    DependencyNotFound(String),

    #[error("Package registry error: {0}")]
    Registry(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),
}

impl MigrationError {
    /// The code to report for this error, given the migration's own failure code.
    ///
    /// Errors with a dedicated code (validation, missing dependency, permission denied)
    /// keep it; everything else is reported as `fallback`.
    pub fn code_or(&self, fallback: ErrorCode) -> ErrorCode {
        match self {
            MigrationError::Validation(_) => ErrorCode::ValidationError,
            MigrationError::DependencyNotFound(_) => ErrorCode::DependencyNotFound,
            MigrationError::GitHub(github_client::Error::Forbidden(_)) => ErrorCode::Forbidden,
            MigrationError::Authentication(_) => ErrorCode::AuthenticationFailed,
            _ => fallback,
        }
    }
}

impl From<auth_handler::AuthError> for MigrationError {
    fn from(value: auth_handler::AuthError) -> Self {
        MigrationError::Authentication(value.to_string())
    }
}

/// Result type alias for migration operations.
pub type CoreResult<T> = Result<T, MigrationError>;
