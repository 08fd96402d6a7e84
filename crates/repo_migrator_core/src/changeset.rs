//! Change detection on a working copy.
//!
//! The source-control status report is parsed into [`ParsedStatusEntry`] values and every
//! admitted entry is turned into a [`ChangedFile`] carrying the file's full new content.

use std::path::Path;

use tracing::{debug, instrument};

use crate::errors::{CoreResult, MigrationError};
use crate::git::SourceControl;
use crate::result::ChangedFile;

#[cfg(test)]
#[path = "changeset_tests.rs"]
mod tests;

/// One line of a status report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStatusEntry {
    /// Two-letter status code, e.g. `" M"`, `"A "`, `"??"`.
    pub status: String,
    pub file_path: String,
}

/// Predicate deciding which status codes are reported as changes.
pub type StatusFilter = dyn Fn(&str) -> bool + Send + Sync;

/// Admits everything except deletions.
pub fn default_status_filter(status: &str) -> bool {
    !status.contains('D')
}

/// Parses a porcelain-style status report.
///
/// Lines shorter than four characters are ignored. For renames (`old -> new`) the new path
/// is kept.
///
/// # Examples
///
/// ```rust
/// use repo_migrator_core::parse_status;
///
/// let entries = parse_status(" M src/file.ts\nR  old.ts -> new.ts\n");
/// assert_eq!(entries[0].status, " M");
/// assert_eq!(entries[1].file_path, "new.ts");
/// ```
pub fn parse_status(report: &str) -> Vec<ParsedStatusEntry> {
    report
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| line.len() >= 4)
        .filter_map(|line| {
            let status = line.get(0..2)?;
            let path = line.get(3..)?.trim();
            let path = match path.split_once(" -> ") {
                Some((_, new)) => new.trim(),
                None => path,
            };
            if path.is_empty() {
                return None;
            }
            Some(ParsedStatusEntry {
                status: status.to_string(),
                file_path: path.to_string(),
            })
        })
        .collect()
}

/// Builds the changed files for an already parsed report.
///
/// Entries rejected by `status_filter` are skipped. Admitted entries whose status contains
/// `D` become deleted entries; all others are read from `working_directory`.
pub fn changed_files_from_entries(
    working_directory: &Path,
    entries: &[ParsedStatusEntry],
    status_filter: &StatusFilter,
) -> CoreResult<Vec<ChangedFile>> {
    let mut changed = Vec::new();
    for entry in entries {
        if !status_filter(&entry.status) {
            continue;
        }

        let path = normalize_path(&entry.file_path);
        if entry.status.contains('D') {
            changed.push(ChangedFile::deleted(path));
            continue;
        }

        let content = std::fs::read_to_string(working_directory.join(&path)).map_err(|e| {
            MigrationError::FileRead {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;
        changed.push(ChangedFile::modified(path, content));
    }
    Ok(changed)
}

/// Lists the files changed in `working_directory`, in status report order.
///
/// `status_filter` defaults to [`default_status_filter`].
#[instrument(skip(source_control, status_filter), fields(dir = ?working_directory))]
pub async fn compute_changed(
    source_control: &dyn SourceControl,
    working_directory: &Path,
    status_filter: Option<&StatusFilter>,
) -> CoreResult<Vec<ChangedFile>> {
    let report = source_control.status_report(working_directory).await?;
    let entries = parse_status(&report);
    debug!("Status report has {} entries", entries.len());

    changed_files_from_entries(
        working_directory,
        &entries,
        status_filter.unwrap_or(&default_status_filter),
    )
}

/// Converts a path to the repository-relative, forward-slash form.
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut path = path.as_str();
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path.trim_start_matches('/').to_string()
}
