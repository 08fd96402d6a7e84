//! `package.json` transforms.
//!
//! The manifest is parsed with key order preserved and written back with the indentation of
//! the original. When nothing changes the original text is returned as is.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use super::is_newer;
use crate::errors::{CoreResult, MigrationError};

#[cfg(test)]
#[path = "package_json_tests.rs"]
mod tests;

pub const PACKAGE_JSON: &str = "package.json";

const DEPENDENCY_SECTIONS: [&str; 4] = [
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

static VERSION_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\^|~|>=|>|<=|<|=)?(\s*)v?(\d+(?:\.\d+){0,2}(?:[-+][0-9A-Za-z.-]+)?)$")
        .expect("valid regex")
});

/// Sets every listed dependency to its target version, keeping the range prefix (`^`, `~`,
/// `>=`, ...) of the current requirement.
///
/// With `only`, just that dependency is updated. It must appear in one of the dependency
/// sections, otherwise `DependencyNotFound` is returned. Requirements that are not plain
/// versions (`workspace:*`, git URLs, tags) and versions above the target are left alone.
pub fn update_dependencies(
    content: &str,
    versions: &BTreeMap<String, String>,
    only: Option<&str>,
) -> CoreResult<String> {
    let mut manifest = parse(content)?;
    let root = as_object(&mut manifest)?;

    if let Some(name) = only {
        let listed = DEPENDENCY_SECTIONS.iter().any(|section| {
            root.get(*section)
                .and_then(Value::as_object)
                .map(|deps| deps.contains_key(name))
                .unwrap_or(false)
        });
        if !listed {
            return Err(MigrationError::DependencyNotFound(name.to_string()));
        }
    }

    let mut changed = false;
    for section in DEPENDENCY_SECTIONS {
        let Some(deps) = root.get_mut(section).and_then(Value::as_object_mut) else {
            continue;
        };
        for (name, requirement) in deps.iter_mut() {
            if only.is_some_and(|only| only != name.as_str()) {
                continue;
            }
            let (Some(target), Some(current)) = (versions.get(name), requirement.as_str()) else {
                continue;
            };
            if let Some(updated) = bump_requirement(current, target) {
                *requirement = Value::String(updated);
                changed = true;
            }
        }
    }

    if !changed {
        return Ok(content.to_string());
    }
    render(&manifest, content)
}

/// Returns the new requirement string, or `None` when `current` should stay.
fn bump_requirement(current: &str, target: &str) -> Option<String> {
    let caps = VERSION_RANGE.captures(current.trim())?;
    let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let version = &caps[3];
    let target = target.trim().trim_start_matches('v');

    if !is_newer(target, version) {
        return None;
    }
    Some(format!("{}{}", prefix, target))
}

/// Adds `scripts.lint` when the manifest does not define it yet.
pub fn add_lint_script(content: &str, script: &str) -> CoreResult<String> {
    let mut manifest = parse(content)?;
    let root = as_object(&mut manifest)?;

    let scripts = root
        .entry("scripts")
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(scripts) = scripts.as_object_mut() else {
        return Err(transform_error("\"scripts\" is not an object"));
    };
    if scripts.contains_key("lint") {
        return Ok(content.to_string());
    }
    scripts.insert("lint".to_string(), Value::String(script.to_string()));

    render(&manifest, content)
}

fn parse(content: &str) -> CoreResult<Value> {
    serde_json::from_str(content).map_err(|e| transform_error(&e.to_string()))
}

fn as_object(manifest: &mut Value) -> CoreResult<&mut Map<String, Value>> {
    manifest
        .as_object_mut()
        .ok_or_else(|| transform_error("root is not a JSON object"))
}

fn transform_error(reason: &str) -> MigrationError {
    MigrationError::Transform {
        path: PACKAGE_JSON.to_string(),
        reason: reason.to_string(),
    }
}

/// Serializes `manifest` using the indentation and trailing newline of `original`.
fn render(manifest: &Value, original: &str) -> CoreResult<String> {
    let indent = detect_indent(original);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    manifest
        .serialize(&mut serializer)
        .map_err(|e| transform_error(&e.to_string()))?;

    let mut rendered = String::from_utf8(buffer).map_err(|e| transform_error(&e.to_string()))?;
    if original.ends_with('\n') {
        rendered.push('\n');
    }
    Ok(rendered)
}

fn detect_indent(content: &str) -> String {
    content
        .lines()
        .skip(1)
        .find(|line| !line.trim().is_empty())
        .map(|line| {
            line.chars()
                .take_while(|c| *c == ' ' || *c == '\t')
                .collect::<String>()
        })
        .filter(|indent| !indent.is_empty())
        .unwrap_or_else(|| "  ".to_string())
}
