//! Dockerfile transforms.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::is_newer;

#[cfg(test)]
#[path = "dockerfile_tests.rs"]
mod tests;

pub const DOCKERFILE: &str = "Dockerfile";

static FROM_NODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?mi)^(\s*FROM\s+(?:--platform=\S+\s+)?(?:[\w.:-]+/)*node:)(\d+(?:\.\d+){0,2})((?:-[\w.-]+)?)(\s|$)",
    )
    .expect("valid regex")
});

/// Rewrites `FROM node:<version>[-suffix]` lines to `version`, keeping the variant suffix
/// (`-alpine`, `-slim`, ...) and any stage name. Images are never downgraded.
pub fn update_node_image(content: &str, version: &str) -> String {
    FROM_NODE
        .replace_all(content, |caps: &Captures| {
            if is_newer(version, &caps[2]) {
                format!("{}{}{}{}", &caps[1], version, &caps[3], &caps[4])
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}
