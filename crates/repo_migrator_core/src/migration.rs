//! The migration abstraction.
//!
//! A migration declares which files it reads ([`Scope`]), how the pipeline obtains them
//! ([`Acquisition`]), what the pull request looks like ([`Proposal`]) and, once prepared for a
//! repository, a pure [`FileTransform`] over the file set. The pipeline that fetches, diffs
//! and proposes is written once in [`crate::pipeline`].

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use config_manager::MigrationSettings;
use github_client::RepositoryClient;

use crate::errors::{CoreResult, ErrorCode};
use crate::npm_registry::PackageRegistry;
use crate::repository::RepositoryRef;

#[cfg(test)]
#[path = "migration_tests.rs"]
mod tests;

/// Repository-relative path to file content.
pub type FileSet = BTreeMap<String, String>;

/// The workflow directory scope shared by all workflow migrations.
pub const WORKFLOWS: Scope = Scope::Directory {
    dir: ".github/workflows",
    extensions: &["yml", "yaml"],
};

/// A set of files a migration may read and change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Files directly inside `dir` whose extension is one of `extensions`.
    Directory {
        dir: &'static str,
        extensions: &'static [&'static str],
    },
    /// A single file. A missing file is simply absent from the file set.
    File(&'static str),
}

impl Scope {
    /// True when `path` falls inside this scope.
    pub fn contains(&self, path: &str) -> bool {
        match self {
            Scope::File(file) => path == *file,
            Scope::Directory { dir, extensions } => {
                let Some(name) = path
                    .strip_prefix(dir)
                    .and_then(|rest| rest.strip_prefix('/'))
                else {
                    return false;
                };
                !name.contains('/')
                    && name
                        .rsplit_once('.')
                        .map(|(_, ext)| extensions.contains(&ext))
                        .unwrap_or(false)
            }
        }
    }
}

/// How the pipeline obtains a migration's files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// Fetch the scoped files through the contents API.
    Remote,
    /// Shallow-clone the repository and diff the working copy.
    Clone,
}

/// How the branch for a proposal is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchNaming {
    /// `<prefix>-<unix millis>`
    Timestamped(&'static str),
    Fixed(&'static str),
}

impl BranchNaming {
    pub fn branch_name(&self, now_millis: i64) -> String {
        match self {
            BranchNaming::Timestamped(prefix) => format!("{}-{}", prefix, now_millis),
            BranchNaming::Fixed(name) => name.to_string(),
        }
    }
}

/// Pull request metadata of a migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub branch: BranchNaming,
    pub commit_message: String,
    pub pull_request_title: String,
    pub pull_request_body: String,
}

impl Proposal {
    pub fn new(
        branch: BranchNaming,
        commit_message: impl Into<String>,
        pull_request_title: impl Into<String>,
        pull_request_body: impl Into<String>,
    ) -> Self {
        Self {
            branch,
            commit_message: commit_message.into(),
            pull_request_title: pull_request_title.into(),
            pull_request_body: pull_request_body.into(),
        }
    }
}

/// Request parameters a migration may use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationParameters {
    /// Restricts `update-dependencies` to a single package.
    pub dependency: Option<String>,
}

/// Everything a migration can consult while preparing.
pub struct MigrationContext<'a> {
    pub repository: &'a RepositoryRef,
    pub client: &'a dyn RepositoryClient,
    pub package_registry: &'a dyn PackageRegistry,
    pub settings: &'a MigrationSettings,
    pub parameters: &'a MigrationParameters,
}

/// A pure function over a file set.
///
/// Returns the complete new file set. Implementations must not do I/O and must be
/// idempotent.
pub trait FileTransform: Send + Sync {
    fn apply(&self, files: &FileSet) -> CoreResult<FileSet>;
}

type TextFn = dyn Fn(&str, &str) -> CoreResult<String> + Send + Sync;

/// A [`FileTransform`] applying one text function, given `(path, content)`, to every file.
pub struct TextTransform {
    function: Box<TextFn>,
}

impl TextTransform {
    pub fn new(function: impl Fn(&str, &str) -> CoreResult<String> + Send + Sync + 'static) -> Self {
        Self {
            function: Box::new(function),
        }
    }

    /// Wraps an infallible `content -> content` function.
    pub fn infallible(function: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self::new(move |_, content| Ok(function(content)))
    }
}

impl FileTransform for TextTransform {
    fn apply(&self, files: &FileSet) -> CoreResult<FileSet> {
        files
            .iter()
            .map(|(path, content)| -> CoreResult<(String, String)> {
                Ok((path.clone(), (self.function)(path, content)?))
            })
            .collect()
    }
}

/// Applies transforms one after another.
pub struct ChainedTransform {
    transforms: Vec<Box<dyn FileTransform>>,
}

impl ChainedTransform {
    pub fn new(transforms: Vec<Box<dyn FileTransform>>) -> Self {
        Self { transforms }
    }
}

impl FileTransform for ChainedTransform {
    fn apply(&self, files: &FileSet) -> CoreResult<FileSet> {
        let mut current = files.clone();
        for transform in &self.transforms {
            current = transform.apply(&current)?;
        }
        Ok(current)
    }
}

/// One self-contained transform-and-propose operation.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Registry name, e.g. `remove-npm-token`.
    fn name(&self) -> &'static str;

    fn scopes(&self) -> Vec<Scope>;

    fn acquisition(&self) -> Acquisition {
        Acquisition::Remote
    }

    /// Code reported when the migration fails for a reason without a dedicated code.
    fn error_code(&self) -> ErrorCode;

    fn proposal(&self) -> Proposal;

    /// Resolves everything the transform needs from the outside world, such as `latest`
    /// versions, and returns the pure transform to run.
    async fn prepare(&self, context: &MigrationContext<'_>) -> CoreResult<Box<dyn FileTransform>>;
}

/// Maps migration names to migrations.
#[derive(Clone, Default)]
pub struct MigrationRegistry {
    migrations: BTreeMap<&'static str, Arc<dyn Migration>>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `migration`, replacing any migration registered under the same name.
    pub fn register(&mut self, migration: Arc<dyn Migration>) {
        self.migrations.insert(migration.name(), migration);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Migration>> {
        self.migrations.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.migrations.contains_key(name)
    }

    /// Registered names in alphabetical order.
    pub fn names(&self) -> Vec<&'static str> {
        self.migrations.keys().copied().collect()
    }
}

impl std::fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationRegistry")
            .field("migrations", &self.names())
            .finish()
    }
}
