//! Hand-written collaborators shared by the unit tests of this crate.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use git2::{Repository as GitRepository, Signature};
use github_client::{
    ClassicBranchProtection, EntryType, Error, FileContent, FileUpdate, GitRef, PullRequest,
    PullRequestCreate, Release, Repository, RepositoryClient, RepositoryRuleset, Tag, TreeEntry,
};
use secrecy::SecretString;
use url::Url;

use crate::errors::{CoreResult, MigrationError};
use crate::git::{Git2SourceControl, SourceControl};
use crate::metrics::{MigrationMetrics, RunOutcome};
use crate::npm_registry::PackageRegistry;

/// In-memory repository. Every call is recorded by name in `calls`.
pub struct MockRepositoryClient {
    pub repository: Mutex<Option<Repository>>,
    pub files: Mutex<BTreeMap<String, String>>,
    pub rulesets: Mutex<Vec<RepositoryRuleset>>,
    pub protection: Mutex<Option<ClassicBranchProtection>>,
    pub latest_releases: Mutex<BTreeMap<String, Release>>,
    pub tags: Mutex<Vec<Tag>>,
    pub calls: Mutex<Vec<String>>,
    pub created_refs: Mutex<Vec<(String, String)>>,
    pub file_updates: Mutex<Vec<FileUpdate>>,
    pub deleted_files: Mutex<Vec<String>>,
    pub pull_requests: Mutex<Vec<PullRequestCreate>>,
    pub auto_merged: Mutex<Vec<String>>,
    pub created_rulesets: Mutex<Vec<RepositoryRuleset>>,
    pub protection_deleted: AtomicBool,
    failures: Mutex<BTreeMap<&'static str, u16>>,
}

impl MockRepositoryClient {
    /// `octo/widgets` with default branch `main` and no files.
    pub fn new() -> Self {
        Self {
            repository: Mutex::new(Some(Repository::new("octo/widgets", "main"))),
            files: Mutex::new(BTreeMap::new()),
            rulesets: Mutex::new(Vec::new()),
            protection: Mutex::new(None),
            latest_releases: Mutex::new(BTreeMap::new()),
            tags: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            created_refs: Mutex::new(Vec::new()),
            file_updates: Mutex::new(Vec::new()),
            deleted_files: Mutex::new(Vec::new()),
            pull_requests: Mutex::new(Vec::new()),
            auto_merged: Mutex::new(Vec::new()),
            created_rulesets: Mutex::new(Vec::new()),
            protection_deleted: AtomicBool::new(false),
            failures: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
        self
    }

    pub fn with_ruleset(self, ruleset: RepositoryRuleset) -> Self {
        self.rulesets.lock().unwrap().push(ruleset);
        self
    }

    pub fn with_protection(self, protection: ClassicBranchProtection) -> Self {
        *self.protection.lock().unwrap() = Some(protection);
        self
    }

    pub fn with_latest_release(self, repository: &str, tag: &str) -> Self {
        self.latest_releases.lock().unwrap().insert(
            repository.to_string(),
            Release {
                tag_name: tag.to_string(),
                name: None,
                prerelease: false,
                draft: false,
            },
        );
        self
    }

    pub fn with_tags(self, tags: Vec<Tag>) -> Self {
        *self.tags.lock().unwrap() = tags;
        self
    }

    pub fn without_repository(self) -> Self {
        *self.repository.lock().unwrap() = None;
        self
    }

    /// Makes `method` fail with an API error of the given status.
    pub fn failing(self, method: &'static str, status: u16) -> Self {
        self.failures.lock().unwrap().insert(method, status);
        self
    }

    pub fn called(&self, method: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|c| c == method)
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == method)
            .count()
    }

    fn record(&self, method: &'static str) -> Result<(), Error> {
        self.calls.lock().unwrap().push(method.to_string());
        match self.failures.lock().unwrap().get(method) {
            Some(404) => Err(Error::NotFound),
            Some(403) => Err(Error::Forbidden("Resource not accessible".to_string())),
            Some(status) => Err(Error::Api {
                status: *status,
                message: format!("{} failed", method),
            }),
            None => Ok(()),
        }
    }
}

impl Default for MockRepositoryClient {
    fn default() -> Self {
        Self::new()
    }
}

fn blob_sha(path: &str) -> String {
    format!("sha-{}", path.replace('/', "-"))
}

#[async_trait]
impl RepositoryClient for MockRepositoryClient {
    async fn get_repository(&self, _owner: &str, _repo: &str) -> Result<Repository, Error> {
        self.record("get_repository")?;
        self.repository.lock().unwrap().clone().ok_or(Error::NotFound)
    }

    async fn get_file(
        &self,
        _owner: &str,
        _repo: &str,
        path: &str,
        _reference: Option<&str>,
    ) -> Result<Option<FileContent>, Error> {
        self.record("get_file")?;
        Ok(self
            .files
            .lock()
            .unwrap()
            .get(path)
            .map(|content| FileContent {
                path: path.to_string(),
                sha: blob_sha(path),
                content: content.clone(),
            }))
    }

    async fn list_directory(
        &self,
        _owner: &str,
        _repo: &str,
        path: &str,
    ) -> Result<Vec<TreeEntry>, Error> {
        self.record("list_directory")?;
        let prefix = format!("{}/", path.trim_end_matches('/'));
        Ok(self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter_map(|file| {
                let name = file.strip_prefix(&prefix)?;
                if name.contains('/') {
                    return None;
                }
                Some(TreeEntry {
                    name: name.to_string(),
                    path: file.clone(),
                    entry_type: EntryType::File,
                    sha: blob_sha(file),
                    size: 0,
                    download_url: None,
                })
            })
            .collect())
    }

    async fn create_or_update_file(
        &self,
        _owner: &str,
        _repo: &str,
        update: &FileUpdate,
    ) -> Result<String, Error> {
        self.record("create_or_update_file")?;
        self.file_updates.lock().unwrap().push(update.clone());
        Ok(format!("commit-{}", self.file_updates.lock().unwrap().len()))
    }

    async fn delete_file(
        &self,
        _owner: &str,
        _repo: &str,
        path: &str,
        _message: &str,
        _sha: &str,
        _branch: &str,
    ) -> Result<(), Error> {
        self.record("delete_file")?;
        self.deleted_files.lock().unwrap().push(path.to_string());
        Ok(())
    }

    async fn get_branch_ref(
        &self,
        _owner: &str,
        _repo: &str,
        branch: &str,
    ) -> Result<GitRef, Error> {
        self.record("get_branch_ref")?;
        Ok(GitRef {
            name: format!("refs/heads/{}", branch),
            sha: "base-sha".to_string(),
        })
    }

    async fn create_branch_ref(
        &self,
        _owner: &str,
        _repo: &str,
        branch: &str,
        sha: &str,
    ) -> Result<GitRef, Error> {
        self.record("create_branch_ref")?;
        self.created_refs
            .lock()
            .unwrap()
            .push((branch.to_string(), sha.to_string()));
        Ok(GitRef {
            name: format!("refs/heads/{}", branch),
            sha: sha.to_string(),
        })
    }

    async fn create_pull_request(
        &self,
        _owner: &str,
        _repo: &str,
        pull_request: &PullRequestCreate,
    ) -> Result<PullRequest, Error> {
        self.record("create_pull_request")?;
        self.pull_requests.lock().unwrap().push(pull_request.clone());
        Ok(PullRequest {
            number: 42,
            html_url: "https://github.com/octo/widgets/pull/42".to_string(),
            node_id: "PR_kwDOA42".to_string(),
        })
    }

    async fn enable_auto_merge(&self, pull_request_node_id: &str) -> Result<(), Error> {
        self.record("enable_auto_merge")?;
        self.auto_merged
            .lock()
            .unwrap()
            .push(pull_request_node_id.to_string());
        Ok(())
    }

    async fn list_rulesets(
        &self,
        _owner: &str,
        _repo: &str,
    ) -> Result<Vec<RepositoryRuleset>, Error> {
        self.record("list_rulesets")?;
        Ok(self
            .rulesets
            .lock()
            .unwrap()
            .iter()
            .map(|r| RepositoryRuleset {
                conditions: None,
                rules: vec![],
                ..r.clone()
            })
            .collect())
    }

    async fn get_ruleset(
        &self,
        _owner: &str,
        _repo: &str,
        ruleset_id: u64,
    ) -> Result<RepositoryRuleset, Error> {
        self.record("get_ruleset")?;
        self.rulesets
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == Some(ruleset_id))
            .cloned()
            .ok_or(Error::NotFound)
    }

    async fn create_ruleset(
        &self,
        _owner: &str,
        _repo: &str,
        ruleset: &RepositoryRuleset,
    ) -> Result<RepositoryRuleset, Error> {
        self.record("create_ruleset")?;
        self.created_rulesets.lock().unwrap().push(ruleset.clone());
        Ok(RepositoryRuleset {
            id: Some(100),
            ..ruleset.clone()
        })
    }

    async fn get_branch_protection(
        &self,
        _owner: &str,
        _repo: &str,
        _branch: &str,
    ) -> Result<Option<ClassicBranchProtection>, Error> {
        self.record("get_branch_protection")?;
        Ok(self.protection.lock().unwrap().clone())
    }

    async fn delete_branch_protection(
        &self,
        _owner: &str,
        _repo: &str,
        _branch: &str,
    ) -> Result<(), Error> {
        self.record("delete_branch_protection")?;
        self.protection_deleted.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn get_latest_release(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Option<Release>, Error> {
        self.record("get_latest_release")?;
        Ok(self
            .latest_releases
            .lock()
            .unwrap()
            .get(&format!("{}/{}", owner, repo))
            .cloned())
    }

    async fn list_tags(&self, _owner: &str, _repo: &str) -> Result<Vec<Tag>, Error> {
        self.record("list_tags")?;
        Ok(self.tags.lock().unwrap().clone())
    }
}

/// Clones by writing a fixed file set into a fresh git repository; status comes from libgit2.
pub struct MockSourceControl {
    files: Vec<(String, String)>,
    pub clones: Mutex<Vec<(String, String)>>,
    fail_clone: bool,
}

impl MockSourceControl {
    pub fn new(files: Vec<(&str, &str)>) -> Self {
        Self {
            files: files
                .into_iter()
                .map(|(p, c)| (p.to_string(), c.to_string()))
                .collect(),
            clones: Mutex::new(Vec::new()),
            fail_clone: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_clone: true,
            ..Self::new(vec![])
        }
    }

    /// Writes the file set into `dir` and commits it.
    pub fn init(&self, dir: &Path) {
        let repo = GitRepository::init(dir).unwrap();
        for (path, content) in &self.files {
            let full = dir.join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(full, content).unwrap();
        }

        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let signature = Signature::now("Test", "test@example.com").unwrap();
        repo.commit(Some("HEAD"), &signature, &signature, "init", &tree, &[])
            .unwrap();
    }
}

#[async_trait]
impl SourceControl for MockSourceControl {
    async fn clone_shallow(
        &self,
        url: &Url,
        branch: &str,
        _token: &SecretString,
        destination: &Path,
    ) -> CoreResult<()> {
        self.clones
            .lock()
            .unwrap()
            .push((url.to_string(), branch.to_string()));
        if self.fail_clone {
            return Err(MigrationError::GitOperation(
                "Git clone failed: repository not found".to_string(),
            ));
        }
        self.init(destination);
        Ok(())
    }

    async fn status_report(&self, working_directory: &Path) -> CoreResult<String> {
        Git2SourceControl::new()
            .status_report(working_directory)
            .await
    }
}

/// Registry answering from a fixed table.
#[derive(Default)]
pub struct MockPackageRegistry {
    versions: BTreeMap<String, String>,
    pub lookups: Mutex<Vec<String>>,
}

impl MockPackageRegistry {
    pub fn new(versions: &[(&str, &str)]) -> Self {
        Self {
            versions: versions
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            lookups: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PackageRegistry for MockPackageRegistry {
    async fn latest_version(&self, package: &str) -> CoreResult<String> {
        self.lookups.lock().unwrap().push(package.to_string());
        self.versions
            .get(package)
            .cloned()
            .ok_or_else(|| MigrationError::DependencyNotFound(package.to_string()))
    }
}

/// Counts recorded runs.
#[derive(Default)]
pub struct MockMigrationMetrics {
    pub successes: AtomicU64,
    pub failures: AtomicU64,
    pub noops: AtomicU64,
}

impl MigrationMetrics for MockMigrationMetrics {
    fn record_run(&self, _migration: &str, outcome: RunOutcome, _duration_ms: u64) {
        let counter = match outcome {
            RunOutcome::Proposed => &self.successes,
            RunOutcome::NoChange => &self.noops,
            RunOutcome::Failed => &self.failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
