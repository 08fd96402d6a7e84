//! The acquire, transform, diff and propose pipeline shared by every migration.

use std::path::Path;

use chrono::Utc;
use config_manager::MigrationSettings;
use futures::future::try_join_all;
use github_client::{EntryType, FileUpdate, PullRequestCreate, Repository, RepositoryClient};
use secrecy::SecretString;
use tracing::{debug, error, info, instrument, warn};

use crate::changeset::compute_changed;
use crate::errors::{CoreResult, MigrationError};
use crate::git::{SourceControl, Workspace};
use crate::migration::{
    Acquisition, FileSet, FileTransform, Migration, MigrationContext, MigrationParameters,
    Proposal, Scope,
};
use crate::npm_registry::PackageRegistry;
use crate::repository::RepositoryRef;
use crate::result::{ChangeKind, ChangedFile, MigrationResult, PullRequestInfo};

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;

/// Runs migrations against one repository with one set of credentials.
pub struct MigrationPipeline<'a> {
    client: &'a dyn RepositoryClient,
    source_control: &'a dyn SourceControl,
    package_registry: &'a dyn PackageRegistry,
    settings: &'a MigrationSettings,
    token: &'a SecretString,
}

impl<'a> MigrationPipeline<'a> {
    pub fn new(
        client: &'a dyn RepositoryClient,
        source_control: &'a dyn SourceControl,
        package_registry: &'a dyn PackageRegistry,
        settings: &'a MigrationSettings,
        token: &'a SecretString,
    ) -> Self {
        Self {
            client,
            source_control,
            package_registry,
            settings,
            token,
        }
    }

    /// Runs `migration` and converts any failure into an error result carrying the
    /// migration's error code.
    #[instrument(skip(self, migration, parameters), fields(migration = migration.name(), repository = %repository))]
    pub async fn run(
        &self,
        migration: &dyn Migration,
        repository: &RepositoryRef,
        parameters: &MigrationParameters,
    ) -> MigrationResult {
        match self.try_run(migration, repository, parameters).await {
            Ok(result) => result,
            Err(e) => {
                error!("Migration '{}' failed: {}", migration.name(), e);
                MigrationResult::from_error(&e, migration.error_code())
            }
        }
    }

    async fn try_run(
        &self,
        migration: &dyn Migration,
        repository: &RepositoryRef,
        parameters: &MigrationParameters,
    ) -> CoreResult<MigrationResult> {
        let details = self
            .client
            .get_repository(repository.owner(), repository.name())
            .await?;
        debug!(default_branch = details.default_branch.as_str(), "Fetched repository");

        let context = MigrationContext {
            repository,
            client: self.client,
            package_registry: self.package_registry,
            settings: self.settings,
            parameters,
        };
        let transform = migration.prepare(&context).await?;

        let scopes = migration.scopes();
        let changed = match migration.acquisition() {
            Acquisition::Remote => {
                self.remote_changes(repository, &scopes, transform.as_ref())
                    .await?
            }
            Acquisition::Clone => {
                self.clone_changes(&details, &scopes, transform.as_ref())
                    .await?
            }
        };

        if changed.is_empty() {
            info!("No changes needed");
            return Ok(MigrationResult::empty());
        }

        self.propose(repository, &details.default_branch, &migration.proposal(), changed)
            .await
    }

    /// Fetches the scoped files through the contents API and compares them byte for byte
    /// with the transform output.
    async fn remote_changes(
        &self,
        repository: &RepositoryRef,
        scopes: &[Scope],
        transform: &dyn FileTransform,
    ) -> CoreResult<Vec<ChangedFile>> {
        let fetched = try_join_all(
            scopes
                .iter()
                .map(|scope| self.fetch_scope(repository, scope)),
        )
        .await?;
        let files: FileSet = fetched.into_iter().flatten().collect();
        debug!("Fetched {} files in scope", files.len());

        let output = transform.apply(&files)?;
        Ok(diff(&files, &output, scopes))
    }

    async fn fetch_scope(&self, repository: &RepositoryRef, scope: &Scope) -> CoreResult<FileSet> {
        let (owner, name) = (repository.owner(), repository.name());
        let mut files = FileSet::new();
        match scope {
            Scope::File(path) => {
                if let Some(file) = self.client.get_file(owner, name, path, None).await? {
                    files.insert(file.path, file.content);
                }
            }
            Scope::Directory { dir, .. } => {
                let entries = self.client.list_directory(owner, name, dir).await?;
                for entry in entries {
                    if entry.entry_type != EntryType::File || !scope.contains(&entry.path) {
                        continue;
                    }
                    if let Some(file) = self.client.get_file(owner, name, &entry.path, None).await? {
                        files.insert(file.path, file.content);
                    }
                }
            }
        }
        Ok(files)
    }

    /// Clones the default branch, writes the transform output into the working copy and
    /// reads the changes back from its status report.
    async fn clone_changes(
        &self,
        details: &Repository,
        scopes: &[Scope],
        transform: &dyn FileTransform,
    ) -> CoreResult<Vec<ChangedFile>> {
        let workspace = Workspace::new()?;
        let url = details.clone_url()?;
        self.source_control
            .clone_shallow(&url, &details.default_branch, self.token, workspace.path())
            .await?;

        let files = read_scopes(workspace.path(), scopes)?;
        let output = transform.apply(&files)?;
        for file in diff(&files, &output, scopes) {
            let target = workspace.file_path(&file.path);
            std::fs::write(&target, &file.content).map_err(|e| MigrationError::FileWrite {
                path: file.path.clone(),
                reason: e.to_string(),
            })?;
        }

        compute_changed(self.source_control, workspace.path(), None).await
    }

    /// Creates the branch, commits every changed file and opens the pull request.
    #[instrument(skip(self, proposal, changed), fields(files = changed.len()))]
    async fn propose(
        &self,
        repository: &RepositoryRef,
        base: &str,
        proposal: &Proposal,
        changed: Vec<ChangedFile>,
    ) -> CoreResult<MigrationResult> {
        let (owner, name) = (repository.owner(), repository.name());
        let branch = proposal.branch.branch_name(Utc::now().timestamp_millis());

        let base_ref = self.client.get_branch_ref(owner, name, base).await?;
        self.client
            .create_branch_ref(owner, name, &branch, &base_ref.sha)
            .await?;
        info!(branch = branch.as_str(), "Created branch");

        for file in &changed {
            let existing = self
                .client
                .get_file(owner, name, &file.path, Some(&branch))
                .await?;
            match file.kind {
                ChangeKind::Modified => {
                    let update = FileUpdate {
                        path: file.path.clone(),
                        message: proposal.commit_message.clone(),
                        content: file.content.clone(),
                        branch: branch.clone(),
                        sha: existing.map(|f| f.sha),
                    };
                    self.client.create_or_update_file(owner, name, &update).await?;
                }
                ChangeKind::Deleted => {
                    let Some(existing) = existing else {
                        debug!(path = file.path.as_str(), "Already absent on branch");
                        continue;
                    };
                    self.client
                        .delete_file(
                            owner,
                            name,
                            &file.path,
                            &proposal.commit_message,
                            &existing.sha,
                            &branch,
                        )
                        .await?;
                }
            }
            debug!(path = file.path.as_str(), "Committed file");
        }

        let pull_request = self
            .client
            .create_pull_request(
                owner,
                name,
                &PullRequestCreate {
                    title: proposal.pull_request_title.clone(),
                    head: branch.clone(),
                    base: base.to_string(),
                    body: proposal.pull_request_body.clone(),
                },
            )
            .await?;
        info!(number = pull_request.number, "Opened pull request");

        let mut auto_merge_enabled = false;
        if self.settings.pull_requests.auto_merge {
            match self.client.enable_auto_merge(&pull_request.node_id).await {
                Ok(()) => auto_merge_enabled = true,
                Err(e) => warn!(
                    number = pull_request.number,
                    "Failed to enable auto-merge: {}", e
                ),
            }
        }

        Ok(MigrationResult::proposed(
            changed,
            branch,
            proposal.commit_message.clone(),
            proposal.pull_request_title.clone(),
            Some(PullRequestInfo {
                number: pull_request.number,
                url: pull_request.html_url,
                auto_merge_enabled,
            }),
        ))
    }
}

/// Files of `output` inside `scopes` whose content differs from `input`, in path order.
///
/// Paths the transform dropped from the set are not treated as deletions.
fn diff(input: &FileSet, output: &FileSet, scopes: &[Scope]) -> Vec<ChangedFile> {
    output
        .iter()
        .filter(|(path, _)| scopes.iter().any(|scope| scope.contains(path)))
        .filter(|(path, content)| input.get(*path) != Some(*content))
        .map(|(path, content)| ChangedFile::modified(path.clone(), content.clone()))
        .collect()
}

/// Reads the scoped files of a working copy. Missing files and directories are absent.
fn read_scopes(root: &Path, scopes: &[Scope]) -> CoreResult<FileSet> {
    let mut files = FileSet::new();
    for scope in scopes {
        let candidates: Vec<String> = match scope {
            Scope::File(path) => vec![path.to_string()],
            Scope::Directory { dir, .. } => match std::fs::read_dir(root.join(dir)) {
                Ok(entries) => entries
                    .filter_map(Result::ok)
                    .filter(|entry| entry.path().is_file())
                    .map(|entry| format!("{}/{}", dir, entry.file_name().to_string_lossy()))
                    .collect(),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
                Err(e) => {
                    return Err(MigrationError::FileRead {
                        path: dir.to_string(),
                        reason: e.to_string(),
                    })
                }
            },
        };

        for path in candidates {
            if !scope.contains(&path) {
                continue;
            }
            match std::fs::read_to_string(root.join(&path)) {
                Ok(content) => {
                    files.insert(path, content);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(MigrationError::FileRead {
                        path,
                        reason: e.to_string(),
                    })
                }
            }
        }
    }
    Ok(files)
}
