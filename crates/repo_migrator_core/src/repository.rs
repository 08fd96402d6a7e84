//! Repository identification.
//!
//! Requests name their target as `owner/repo`. The parts are validated against GitHub's
//! naming rules before any API call is made.

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;

/// Validated GitHub repository name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryName(String);

impl RepositoryName {
    /// Create a new repository name with validation
    ///
    /// # Validation Rules
    /// - Length: 1-100 characters
    /// - Characters: ASCII alphanumeric, hyphens, underscores, periods
    /// - Must not start with `.` or `-`
    ///
    /// # Errors
    /// Returns `ValidationError` if validation fails
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(ValidationError::empty_field("repository_name"));
        }

        if name.len() > 100 {
            return Err(ValidationError::too_long(
                "repository_name",
                name.len(),
                100,
            ));
        }

        if name.starts_with('.') || name.starts_with('-') {
            return Err(ValidationError::invalid_format(
                "repository_name",
                "must not start with '.' or '-'",
            ));
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(ValidationError::invalid_format(
                "repository_name",
                "must contain only alphanumeric characters, hyphens, underscores, or periods",
            ));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated GitHub user or organization name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerName(String);

impl OwnerName {
    /// Create a new owner name with validation
    ///
    /// # Validation Rules
    /// - Length: 1-39 characters
    /// - Characters: ASCII alphanumeric and hyphens only
    /// - Must not start or end with hyphen
    ///
    /// # Errors
    /// Returns `ValidationError` if validation fails
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(ValidationError::empty_field("owner"));
        }

        if name.len() > 39 {
            return Err(ValidationError::too_long("owner", name.len(), 39));
        }

        if name.starts_with('-') || name.ends_with('-') {
            return Err(ValidationError::invalid_format(
                "owner",
                "must not start or end with hyphen",
            ));
        }

        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ValidationError::invalid_format(
                "owner",
                "must contain only alphanumeric characters and hyphens",
            ));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A repository identified by owner and name.
///
/// # Examples
///
/// ```rust
/// use repo_migrator_core::RepositoryRef;
///
/// let repo = RepositoryRef::parse("octo/widgets").unwrap();
/// assert_eq!(repo.owner(), "octo");
/// assert_eq!(repo.to_string(), "octo/widgets");
///
/// let short = RepositoryRef::parse_with_default_owner("widgets", Some("octo")).unwrap();
/// assert_eq!(short, repo);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    owner: OwnerName,
    name: RepositoryName,
}

impl RepositoryRef {
    pub fn new(owner: OwnerName, name: RepositoryName) -> Self {
        Self { owner, name }
    }

    /// Parses `owner/repo`.
    pub fn parse(full_name: &str) -> Result<Self, ValidationError> {
        Self::parse_with_default_owner(full_name, None)
    }

    /// Parses `owner/repo`, or a bare `repo` when `default_owner` is given.
    pub fn parse_with_default_owner(
        full_name: &str,
        default_owner: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(ValidationError::empty_field("repository"));
        }

        let (owner, name) = match full_name.split_once('/') {
            Some((owner, name)) => (owner, name),
            None => match default_owner {
                Some(owner) => (owner, full_name),
                None => {
                    return Err(ValidationError::invalid_format(
                        "repository",
                        "expected 'owner/name'",
                    ))
                }
            },
        };

        Ok(Self {
            owner: OwnerName::new(owner)?,
            name: RepositoryName::new(name)?,
        })
    }

    pub fn owner(&self) -> &str {
        self.owner.as_str()
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

impl std::fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
