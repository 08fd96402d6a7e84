//! Pure per-file transforms.
//!
//! Every function here takes the current text of one file and returns its new text. They do
//! no I/O, return their input unchanged when there is nothing to do, and are idempotent:
//! applying a transform to its own output changes nothing.

pub mod dockerfile;
pub mod package_json;
pub mod workflows;

pub use dockerfile::update_node_image;
pub use package_json::{add_lint_script, update_dependencies};
pub use workflows::{add_oidc_permissions, remove_npm_token, update_action_versions, update_runner_os};

use semver::Version;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

/// Parses a version as found in labels and requirements (`24.04`, `v4`, `5.3.1`,
/// `1.0.0-beta.1`) into a semantic version.
///
/// A leading `v` is ignored and missing minor or patch components are zero, so `22` reads as
/// `22.0.0`. Returns `None` for anything else, e.g. `latest` or `4.x`.
pub(crate) fn parse_version(version: &str) -> Option<Version> {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    let (core, suffix) = version.split_at(version.find(['-', '+']).unwrap_or(version.len()));

    let parts = core
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    let part = |i: usize| parts.get(i).copied().unwrap_or(0);
    Version::parse(&format!("{}.{}.{}{}", part(0), part(1), part(2), suffix)).ok()
}

/// True when `candidate` is a strictly higher version than `current`.
///
/// Versions that do not parse are never considered newer.
pub(crate) fn is_newer(candidate: &str, current: &str) -> bool {
    match (parse_version(candidate), parse_version(current)) {
        (Some(candidate), Some(current)) => candidate > current,
        _ => false,
    }
}
