//! Local working copies.
//!
//! Migrations that need the whole repository tree clone it shallowly into a temporary
//! directory. The directory is removed when the [`Workspace`] is dropped, on every exit path.
//!
//! For GitHub API operations (branches, commits, pull requests), see the `github_client`
//! crate.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use git2::{build::RepoBuilder, FetchOptions, Repository, Status, StatusOptions};
use secrecy::{ExposeSecret, SecretString};
use temp_dir::TempDir;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::errors::{CoreResult, MigrationError};

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;

/// Source-control operations the pipeline needs on a local working copy.
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Clones `branch` of `url` with depth 1 into `destination`, authenticating with `token`.
    async fn clone_shallow(
        &self,
        url: &Url,
        branch: &str,
        token: &SecretString,
        destination: &Path,
    ) -> CoreResult<()>;

    /// Returns a porcelain-style status report of the working copy: one `XY path` line per
    /// changed entry, where `XY` is the two-letter status code.
    async fn status_report(&self, working_directory: &Path) -> CoreResult<String>;
}

/// A temporary directory holding one working copy.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> CoreResult<Self> {
        let dir = TempDir::with_prefix("repo-migrator-").map_err(|e| {
            error!("Failed to create temporary workspace: {}", e);
            MigrationError::GitOperation(format!("Failed to create temporary workspace: {}", e))
        })?;
        debug!(path = ?dir.path(), "Workspace created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of a repository-relative file.
    pub fn file_path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }
}

/// [`SourceControl`] backed by libgit2.
#[derive(Debug, Default, Clone)]
pub struct Git2SourceControl;

impl Git2SourceControl {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SourceControl for Git2SourceControl {
    #[instrument(skip(self, token), fields(url = %url, branch = branch))]
    async fn clone_shallow(
        &self,
        url: &Url,
        branch: &str,
        token: &SecretString,
        destination: &Path,
    ) -> CoreResult<()> {
        let url = url.clone();
        let branch = branch.to_string();
        let token = token.clone();
        let destination = destination.to_path_buf();

        tokio::task::spawn_blocking(move || clone_blocking(&url, &branch, &token, &destination))
            .await
            .map_err(|e| MigrationError::GitOperation(format!("Clone task failed: {}", e)))?
    }

    async fn status_report(&self, working_directory: &Path) -> CoreResult<String> {
        let working_directory = working_directory.to_path_buf();

        tokio::task::spawn_blocking(move || status_blocking(&working_directory))
            .await
            .map_err(|e| MigrationError::GitOperation(format!("Status task failed: {}", e)))?
    }
}

fn clone_blocking(
    url: &Url,
    branch: &str,
    token: &SecretString,
    destination: &Path,
) -> CoreResult<()> {
    info!("Cloning {} (branch: {})", url, branch);

    let mut callbacks = git2::RemoteCallbacks::new();
    let token = token.expose_secret().to_string();
    callbacks.credentials(move |_url, _username_from_url, allowed_types| {
        if allowed_types.contains(git2::CredentialType::USER_PASS_PLAINTEXT) {
            git2::Cred::userpass_plaintext("x-access-token", &token)
        } else {
            error!(
                "No supported credential types available. Allowed types: {:?}",
                allowed_types
            );
            Err(git2::Error::from_str(
                "No supported credential types for GitHub authentication",
            ))
        }
    });

    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(callbacks);
    fetch_options.depth(1);

    RepoBuilder::new()
        .branch(branch)
        .fetch_options(fetch_options)
        .clone(url.as_str(), destination)
        .map_err(|e| {
            error!("Git clone failed: {} (class: {:?})", e.message(), e.class());
            let detail = match e.class() {
                git2::ErrorClass::Net => format!("Network error during clone: {}", e.message()),
                git2::ErrorClass::Http => format!(
                    "HTTP error during clone: {}. This may indicate authentication or permission issues.",
                    e.message()
                ),
                _ => format!("Git clone failed: {}", e.message()),
            };
            MigrationError::GitOperation(detail)
        })?;

    info!("Cloned {} into {:?}", url, destination);
    Ok(())
}

fn status_blocking(working_directory: &Path) -> CoreResult<String> {
    let repo = Repository::open(working_directory).map_err(|e| {
        error!(
            "Failed to open git repository at {:?}: {}",
            working_directory, e
        );
        MigrationError::GitOperation(format!("Failed to open git repository: {}", e))
    })?;

    let mut options = StatusOptions::new();
    options
        .include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false)
        .renames_head_to_index(true);

    let statuses = repo.statuses(Some(&mut options)).map_err(|e| {
        error!("Failed to read repository status: {}", e);
        MigrationError::GitOperation(format!("Failed to read repository status: {}", e))
    })?;

    let mut report = String::new();
    for entry in statuses.iter() {
        let status = entry.status();
        let Some(path) = entry.path() else {
            debug!("Skipping status entry with non UTF-8 path");
            continue;
        };

        let path = match entry.head_to_index() {
            Some(delta) if status.contains(Status::INDEX_RENAMED) => {
                match (delta.old_file().path(), delta.new_file().path()) {
                    (Some(old), Some(new)) => {
                        format!("{} -> {}", old.display(), new.display())
                    }
                    _ => path.to_string(),
                }
            }
            _ => path.to_string(),
        };

        report.push_str(&status_code(status));
        report.push(' ');
        report.push_str(&path);
        report.push('\n');
    }

    debug!("Status report has {} entries", statuses.len());
    Ok(report)
}

/// Renders a libgit2 status as the two-letter `XY` code used by `git status --porcelain`.
pub(crate) fn status_code(status: Status) -> String {
    if status.contains(Status::WT_NEW) && !status.intersects(index_flags()) {
        return "??".to_string();
    }

    let index = if status.contains(Status::INDEX_NEW) {
        'A'
    } else if status.contains(Status::INDEX_MODIFIED) {
        'M'
    } else if status.contains(Status::INDEX_DELETED) {
        'D'
    } else if status.contains(Status::INDEX_RENAMED) {
        'R'
    } else if status.contains(Status::INDEX_TYPECHANGE) {
        'T'
    } else {
        ' '
    };

    let worktree = if status.contains(Status::WT_MODIFIED) {
        'M'
    } else if status.contains(Status::WT_DELETED) {
        'D'
    } else if status.contains(Status::WT_RENAMED) {
        'R'
    } else if status.contains(Status::WT_TYPECHANGE) {
        'T'
    } else {
        ' '
    };

    format!("{}{}", index, worktree)
}

fn index_flags() -> Status {
    Status::INDEX_NEW
        | Status::INDEX_MODIFIED
        | Status::INDEX_DELETED
        | Status::INDEX_RENAMED
        | Status::INDEX_TYPECHANGE
}
