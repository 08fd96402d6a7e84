//! GitHub Actions workflow transforms.
//!
//! Workflows are edited as text, line by line, so that comments, key order and formatting
//! survive untouched.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::is_newer;

#[cfg(test)]
#[path = "workflows_tests.rs"]
mod tests;

static RUNNER_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(ubuntu|windows|macos)-(\d+(?:\.\d+)?)\b").expect("valid regex")
});

static USES_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^(\s*-?\s*uses:\s*["']?)([A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+)((?:/[^@\s"']*)?)@(v\d+(?:\.\d+)*)"#,
    )
    .expect("valid regex")
});

static NPM_PUBLISH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bnpm\s+publish\b").expect("valid regex"));

static NPM_TOKEN_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*NODE_AUTH_TOKEN:\s*["']?\$\{\{\s*secrets\.NPM_TOKEN\s*\}\}["']?\s*(#.*)?$"#)
        .expect("valid regex")
});

static ENV_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*env:\s*(#.*)?$").expect("valid regex"));

/// Bumps `ubuntu-N`, `windows-N` and `macos-N` runner labels to the configured versions.
///
/// Labels are never downgraded and `*-latest` labels are left alone.
pub fn update_runner_os(content: &str, os_versions: &BTreeMap<String, String>) -> String {
    RUNNER_LABEL
        .replace_all(content, |caps: &Captures| {
            let os = &caps[1];
            let current = &caps[2];
            match os_versions.get(os) {
                Some(target) if is_newer(target, current) => format!("{}-{}", os, target),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Moves `uses: owner/action@vN` references to the configured major version.
///
/// Only references pinned to a `v`-tag are touched; SHAs and branches are left alone, as are
/// references already at or above the configured major.
pub fn update_action_versions(content: &str, action_versions: &BTreeMap<String, String>) -> String {
    let targets: BTreeMap<String, &String> = action_versions
        .iter()
        .map(|(action, version)| (action.to_ascii_lowercase(), version))
        .collect();

    USES_ACTION
        .replace_all(content, |caps: &Captures| {
            let action = caps[2].to_ascii_lowercase();
            let current = &caps[4];
            match targets.get(&action) {
                Some(target) if major_is_newer(target, current) => {
                    format!("{}{}{}@{}", &caps[1], &caps[2], &caps[3], target)
                }
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn major_is_newer(target: &str, current: &str) -> bool {
    let major = |v: &str| {
        v.strip_prefix('v')
            .and_then(|n| n.split('.').next())
            .map(str::to_string)
    };
    match (major(target), major(current)) {
        (Some(t), Some(c)) => is_newer(&t, &c),
        _ => false,
    }
}

/// True when the workflow publishes to npm.
pub fn publishes_to_npm(content: &str) -> bool {
    NPM_PUBLISH.is_match(content)
}

/// Ensures a workflow that runs `npm publish` grants `id-token: write` at the top level.
///
/// Without a top-level `permissions` block one is inserted before `jobs:` granting
/// `contents: read` and `id-token: write`. An existing block gains the `id-token` entry. The
/// inline `write-all` and `read-all` forms are left unchanged.
pub fn add_oidc_permissions(content: &str) -> String {
    if !publishes_to_npm(content) {
        return content.to_string();
    }

    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();

    let Some(index) = lines.iter().position(|l| is_top_level_key(l, "permissions")) else {
        let Some(jobs) = lines.iter().position(|l| is_top_level_key(l, "jobs")) else {
            return content.to_string();
        };
        let block = [
            "permissions:".to_string(),
            "  contents: read".to_string(),
            "  id-token: write".to_string(),
            String::new(),
        ];
        lines.splice(jobs..jobs, block);
        return join_lines(lines, content);
    };

    let inline = lines[index]
        .split_once(':')
        .map(|(_, v)| strip_comment(v).trim().to_string())
        .unwrap_or_default();

    match inline.as_str() {
        "" => {}
        "{}" => {
            lines.splice(
                index..=index,
                ["permissions:".to_string(), "  id-token: write".to_string()],
            );
            return join_lines(lines, content);
        }
        _ => return content.to_string(),
    }

    let children: Vec<usize> = (index + 1..lines.len())
        .take_while(|&i| lines[i].trim().is_empty() || indentation(&lines[i]) > 0)
        .filter(|&i| !lines[i].trim().is_empty() && !lines[i].trim_start().starts_with('#'))
        .collect();

    if let Some(&existing) = children
        .iter()
        .find(|&&i| lines[i].trim_start().starts_with("id-token:"))
    {
        let value = lines[existing]
            .split_once(':')
            .map(|(_, v)| strip_comment(v).trim().to_string())
            .unwrap_or_default();
        if value == "write" {
            return content.to_string();
        }
        let indent = " ".repeat(indentation(&lines[existing]));
        lines[existing] = format!("{}id-token: write", indent);
        return join_lines(lines, content);
    }

    let indent = children
        .first()
        .map(|&i| indentation(&lines[i]))
        .unwrap_or(2);
    let insert_at = children.last().map(|&i| i + 1).unwrap_or(index + 1);
    lines.insert(insert_at, format!("{}id-token: write", " ".repeat(indent)));
    join_lines(lines, content)
}

/// Removes `NODE_AUTH_TOKEN: ${{ secrets.NPM_TOKEN }}` entries and the `env:` blocks that
/// become empty as a result.
pub fn remove_npm_token(content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let mut removed = vec![false; lines.len()];

    for (i, line) in lines.iter().enumerate() {
        if NPM_TOKEN_LINE.is_match(line) {
            removed[i] = true;
        }
    }

    if !removed.iter().any(|r| *r) {
        return content.to_string();
    }

    for (i, line) in lines.iter().enumerate() {
        if !ENV_KEY.is_match(line) {
            continue;
        }
        let env_indent = indentation(line);
        let block: Vec<usize> = (i + 1..lines.len())
            .take_while(|&j| lines[j].trim().is_empty() || indentation(lines[j]) > env_indent)
            .collect();
        let emptied = block.iter().any(|&j| removed[j])
            && block
                .iter()
                .all(|&j| removed[j] || lines[j].trim().is_empty());
        if emptied {
            removed[i] = true;
        }
    }

    let kept: Vec<String> = lines
        .iter()
        .zip(removed.iter())
        .filter(|(_, removed)| !**removed)
        .map(|(line, _)| line.to_string())
        .collect();
    join_lines(kept, content)
}

fn is_top_level_key(line: &str, key: &str) -> bool {
    line.strip_prefix(key)
        .map(|rest| rest.starts_with(':'))
        .unwrap_or(false)
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn strip_comment(value: &str) -> &str {
    match value.find(" #") {
        Some(i) => &value[..i],
        None => value,
    }
}

/// Joins lines, keeping the trailing newline of `original` if it had one.
fn join_lines(lines: Vec<String>, original: &str) -> String {
    let mut joined = lines.join("\n");
    if original.ends_with('\n') {
        joined.push('\n');
    }
    joined
}
