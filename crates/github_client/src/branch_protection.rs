//! Classic branch protection domain types.
//!
//! These mirror the response of `GET /repos/{owner}/{repo}/branches/{branch}/protection`.
//! Every section is optional because GitHub omits sections that are not configured.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "branch_protection_tests.rs"]
mod tests;

/// Classic (pre-ruleset) protection configured on a single branch.
///
/// # Examples
///
/// ```rust
/// use github_client::ClassicBranchProtection;
///
/// let protection: ClassicBranchProtection = serde_json::from_str(
///     r#"{ "required_linear_history": { "enabled": true } }"#,
/// ).unwrap();
/// assert!(protection.required_pull_request_reviews.is_none());
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ClassicBranchProtection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_status_checks: Option<ClassicStatusChecks>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce_admins: Option<EnabledSetting>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_pull_request_reviews: Option<ClassicPullRequestReviews>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_linear_history: Option<EnabledSetting>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_force_pushes: Option<EnabledSetting>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_deletions: Option<EnabledSetting>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_conversation_resolution: Option<EnabledSetting>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_signatures: Option<EnabledSetting>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_branch: Option<EnabledSetting>,
}

/// A `{ "enabled": bool }` toggle as used throughout the classic protection schema.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct EnabledSetting {
    #[serde(default)]
    pub enabled: bool,
}

/// Required status checks of a classic protection.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ClassicStatusChecks {
    /// Require branches to be up to date before merging.
    #[serde(default)]
    pub strict: bool,

    #[serde(default)]
    pub contexts: Vec<String>,
}

/// Required pull request reviews of a classic protection.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ClassicPullRequestReviews {
    #[serde(default)]
    pub dismiss_stale_reviews: bool,

    #[serde(default)]
    pub require_code_owner_reviews: bool,

    #[serde(default)]
    pub required_approving_review_count: u32,

    #[serde(default)]
    pub require_last_push_approval: bool,
}
