//! # Models
//!
//! Data models for the GitHub resources the migrator reads and writes: repositories,
//! git references, pull requests, releases, tags and app installations.
//!
//! The structs deserialize directly from the REST responses and ignore the fields that
//! are not needed.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// Represents a GitHub account (user or organization).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Account {
    pub id: u64,
    pub login: String,
    #[serde(rename = "type", default)]
    pub account_type: String,
}

/// A GitHub App installation.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Installation {
    pub id: u64,
    pub account: Account,
}

/// Represents a GitHub repository.
///
/// # Examples
///
/// ```rust
/// use github_client::models::Repository;
///
/// let repo = Repository::new("octo/widgets", "main");
///
/// assert_eq!(repo.name(), "widgets");
/// assert_eq!(repo.clone_url().unwrap().as_str(), "https://github.com/octo/widgets.git");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Repository {
    pub full_name: String,

    pub default_branch: String,

    #[serde(default)]
    pub private: bool,

    #[serde(default)]
    pub archived: bool,

    #[serde(default)]
    pub clone_url: Option<String>,
}

impl Repository {
    pub fn new(full_name: impl Into<String>, default_branch: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            default_branch: default_branch.into(),
            private: false,
            archived: false,
            clone_url: None,
        }
    }

    /// Returns the repository name without the owner.
    pub fn name(&self) -> &str {
        self.full_name
            .split_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.full_name)
    }

    /// Returns the HTTPS clone URL, falling back to the github.com URL for the full name.
    pub fn clone_url(&self) -> Result<Url, Error> {
        let raw = match &self.clone_url {
            Some(url) => url.clone(),
            None => format!("https://github.com/{}.git", self.full_name),
        };
        Url::parse(&raw).map_err(|_| Error::InvalidResponse)
    }
}

/// A git reference, e.g. `refs/heads/main`, and the commit it points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRef {
    pub name: String,
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawGitRef {
    #[serde(rename = "ref")]
    pub name: String,
    pub object: RawGitObject,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawGitObject {
    pub sha: String,
}

impl From<RawGitRef> for GitRef {
    fn from(value: RawGitRef) -> Self {
        Self {
            name: value.name,
            sha: value.object.sha,
        }
    }
}

/// Body of `POST /repos/{owner}/{repo}/git/refs`.
#[derive(Debug, Serialize)]
pub(crate) struct CreateRefBody<'a> {
    #[serde(rename = "ref")]
    pub name: String,
    pub sha: &'a str,
}

/// An opened pull request.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
    /// GraphQL node ID, needed to enable auto-merge.
    #[serde(default)]
    pub node_id: String,
}

/// Parameters for opening a pull request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PullRequestCreate {
    pub title: String,
    /// Name of the branch that carries the changes.
    pub head: String,
    /// Name of the branch the changes should be merged into.
    pub base: String,
    pub body: String,
}

/// A published release.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub draft: bool,
}

/// A repository tag.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
}
