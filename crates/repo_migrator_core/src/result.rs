//! The uniform result every migration returns.
//!
//! A [`MigrationResult`] is either a success, possibly a no-op with no changed files, or an
//! error tagged with an [`ErrorCode`]. The HTTP-style status code is derived from the other
//! fields on demand and is never stored.

use serde::{Serialize, Serializer};

use crate::errors::{ErrorCode, MigrationError, ValidationError};

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;

/// Outcome of a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationStatus {
    Success,
    Error,
}

/// Whether a changed file carries new content or was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    #[default]
    Modified,
    Deleted,
}

impl ChangeKind {
    fn is_modified(&self) -> bool {
        *self == ChangeKind::Modified
    }
}

/// A file whose full new content is part of a proposed change.
///
/// `path` is repository relative and uses forward slashes. Deleted files have empty content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedFile {
    pub path: String,
    pub content: String,
    #[serde(rename = "type", skip_serializing_if = "ChangeKind::is_modified")]
    pub kind: ChangeKind,
}

impl ChangedFile {
    pub fn modified(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            kind: ChangeKind::Modified,
        }
    }

    pub fn deleted(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: String::new(),
            kind: ChangeKind::Deleted,
        }
    }
}

/// The pull request opened for a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestInfo {
    pub number: u64,
    pub url: String,
    pub auto_merge_enabled: bool,
}

/// Result of running one migration against one repository.
///
/// # Examples
///
/// ```rust
/// use repo_migrator_core::{ErrorCode, MigrationResult};
///
/// assert_eq!(MigrationResult::empty().status_code(), 200);
///
/// let failed = MigrationResult::failure(ErrorCode::ValidationError, "bad branch");
/// assert_eq!(failed.status_code(), 400);
/// assert!(failed.changed_files().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationResult {
    status: MigrationStatus,
    changed_files: Vec<ChangedFile>,
    branch_name: String,
    commit_message: String,
    pull_request_title: String,
    pull_request: Option<PullRequestInfo>,
    error_code: Option<ErrorCode>,
    error_message: Option<String>,
}

impl MigrationResult {
    /// A successful no-op: nothing changed, nothing proposed.
    pub fn empty() -> Self {
        Self {
            status: MigrationStatus::Success,
            changed_files: Vec::new(),
            branch_name: String::new(),
            commit_message: String::new(),
            pull_request_title: String::new(),
            pull_request: None,
            error_code: None,
            error_message: None,
        }
    }

    /// A successful change that was committed to `branch_name`.
    pub fn proposed(
        changed_files: Vec<ChangedFile>,
        branch_name: impl Into<String>,
        commit_message: impl Into<String>,
        pull_request_title: impl Into<String>,
        pull_request: Option<PullRequestInfo>,
    ) -> Self {
        Self {
            status: MigrationStatus::Success,
            changed_files,
            branch_name: branch_name.into(),
            commit_message: commit_message.into(),
            pull_request_title: pull_request_title.into(),
            pull_request,
            error_code: None,
            error_message: None,
        }
    }

    /// A failed migration. Error results never list changed files.
    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: MigrationStatus::Error,
            error_code: Some(code),
            error_message: Some(message.into()),
            ..Self::empty()
        }
    }

    /// Converts an error raised inside a migration, reporting `fallback` unless the error
    /// has a dedicated code.
    pub fn from_error(error: &MigrationError, fallback: ErrorCode) -> Self {
        Self::failure(error.code_or(fallback), error.to_string())
    }

    /// Combines the results of several migrations run for one event.
    ///
    /// The first error wins. Otherwise the changed files of all results are concatenated and
    /// the metadata of the first result that proposed a change is kept.
    pub fn aggregate(results: impl IntoIterator<Item = MigrationResult>) -> Self {
        let mut combined = Self::empty();
        for result in results {
            if result.is_error() {
                return result;
            }
            if combined.branch_name.is_empty() && !result.branch_name.is_empty() {
                combined.branch_name = result.branch_name;
                combined.commit_message = result.commit_message;
                combined.pull_request_title = result.pull_request_title;
                combined.pull_request = result.pull_request;
            }
            combined.changed_files.extend(result.changed_files);
        }
        combined
    }

    /// HTTP-style status derived from the other fields.
    pub fn status_code(&self) -> u16 {
        status_code_for(self)
    }

    pub fn status(&self) -> MigrationStatus {
        self.status
    }

    pub fn is_error(&self) -> bool {
        self.status == MigrationStatus::Error
    }

    /// True for a success that changed nothing.
    pub fn is_noop(&self) -> bool {
        !self.is_error() && self.changed_files.is_empty()
    }

    pub fn changed_files(&self) -> &[ChangedFile] {
        &self.changed_files
    }

    pub fn branch_name(&self) -> &str {
        &self.branch_name
    }

    pub fn commit_message(&self) -> &str {
        &self.commit_message
    }

    pub fn pull_request_title(&self) -> &str {
        &self.pull_request_title
    }

    pub fn pull_request(&self) -> Option<&PullRequestInfo> {
        self.pull_request.as_ref()
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error_code
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

impl From<ValidationError> for MigrationResult {
    fn from(value: ValidationError) -> Self {
        Self::failure(ErrorCode::ValidationError, MigrationError::Validation(value).to_string())
    }
}

/// Derives the status code of a result.
///
/// * error: 400 for client error codes, otherwise 424
/// * success: 201 when files changed and a branch was created, otherwise 200
pub fn status_code_for(result: &MigrationResult) -> u16 {
    match result.status {
        MigrationStatus::Error => match result.error_code {
            Some(code) if code.is_client_error() => 400,
            _ => 424,
        },
        MigrationStatus::Success => {
            if !result.changed_files.is_empty() && !result.branch_name.is_empty() {
                201
            } else {
                200
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MigrationResultView<'a> {
    status: MigrationStatus,
    changed_files: &'a [ChangedFile],
    branch_name: &'a str,
    commit_message: &'a str,
    pull_request_title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pull_request: Option<&'a PullRequestInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<&'a str>,
    status_code: u16,
}

impl Serialize for MigrationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        MigrationResultView {
            status: self.status,
            changed_files: &self.changed_files,
            branch_name: &self.branch_name,
            commit_message: &self.commit_message,
            pull_request_title: &self.pull_request_title,
            pull_request: self.pull_request.as_ref(),
            error_code: self.error_code,
            error_message: self.error_message.as_deref(),
            status_code: self.status_code(),
        }
        .serialize(serializer)
    }
}
