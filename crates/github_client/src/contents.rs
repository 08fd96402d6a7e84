//! Repository contents domain types.
//!
//! Types for reading, listing and writing files through the GitHub Contents API.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::Error;

#[cfg(test)]
#[path = "contents_tests.rs"]
mod tests;

/// A single entry in a GitHub repository directory listing.
///
/// # Examples
///
/// ```rust
/// use github_client::{TreeEntry, EntryType};
///
/// let entry = TreeEntry {
///     name: "release.yml".to_string(),
///     path: ".github/workflows/release.yml".to_string(),
///     entry_type: EntryType::File,
///     sha: "abc123".to_string(),
///     size: 512,
///     download_url: None,
/// };
///
/// assert!(entry.is_file());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub name: String,

    /// Full path within the repository, e.g. `.github/workflows/ci.yml`.
    pub path: String,

    #[serde(rename = "type")]
    pub entry_type: EntryType,

    pub sha: String,

    /// Size in bytes (0 for directories).
    #[serde(default)]
    pub size: u64,

    #[serde(default)]
    pub download_url: Option<String>,
}

impl TreeEntry {
    pub fn is_file(&self) -> bool {
        self.entry_type == EntryType::File
    }
}

/// Type of entry in a repository directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Dir,
    Symlink,
    Submodule,
}

/// A file read from the repository, with its content already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub path: String,

    /// Blob SHA, required when the file is later updated or deleted.
    pub sha: String,

    pub content: String,
}

/// Raw `GET /repos/{owner}/{repo}/contents/{path}` response for a file.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawFileContent {
    pub path: String,
    pub sha: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub encoding: String,
}

impl RawFileContent {
    /// Decodes the base64 payload. GitHub wraps the encoded text at 60 columns.
    pub(crate) fn decode(self) -> Result<FileContent, Error> {
        let content = if self.encoding == "base64" {
            let compact: String = self
                .content
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            let bytes = STANDARD
                .decode(compact.as_bytes())
                .map_err(|_| Error::InvalidResponse)?;
            String::from_utf8(bytes).map_err(|_| Error::InvalidResponse)?
        } else {
            self.content
        };

        Ok(FileContent {
            path: self.path,
            sha: self.sha,
            content,
        })
    }
}

/// A request to create or update a single file on a branch.
///
/// `sha` must hold the current blob SHA when the file already exists on `branch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpdate {
    pub path: String,
    pub message: String,
    pub content: String,
    pub branch: String,
    pub sha: Option<String>,
}

/// Body of `PUT /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Serialize)]
pub(crate) struct FileUpdateBody<'a> {
    pub message: &'a str,
    pub content: String,
    pub branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
}

impl<'a> From<&'a FileUpdate> for FileUpdateBody<'a> {
    fn from(update: &'a FileUpdate) -> Self {
        Self {
            message: &update.message,
            content: STANDARD.encode(update.content.as_bytes()),
            branch: &update.branch,
            sha: update.sha.as_deref(),
        }
    }
}

/// Body of `DELETE /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Serialize)]
pub(crate) struct FileDeleteBody<'a> {
    pub message: &'a str,
    pub sha: &'a str,
    pub branch: &'a str,
}

/// Commit information returned by the contents write endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct ContentsCommitResponse {
    pub commit: CommitSummary,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitSummary {
    pub sha: String,
}
