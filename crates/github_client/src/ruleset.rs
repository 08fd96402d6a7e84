//! Repository ruleset domain types.
//!
//! Rulesets are the rule-object based successor of classic branch protection. The types in
//! this module follow the shape of the GitHub REST API so that they can be sent to and read
//! from `/repos/{owner}/{repo}/rulesets` without an intermediate representation.
//!
//! See: https://docs.github.com/en/rest/repos/rules

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[cfg(test)]
#[path = "ruleset_tests.rs"]
mod tests;

/// Integration ID of the GitHub Actions app, used to pin required status checks to checks
/// reported by workflow runs.
pub const GITHUB_ACTIONS_INTEGRATION_ID: u64 = 15368;

/// Ref-name pattern that GitHub resolves to the repository default branch.
pub const DEFAULT_BRANCH_PATTERN: &str = "~DEFAULT_BRANCH";

/// Ref-name pattern that GitHub resolves to every branch.
pub const ALL_BRANCHES_PATTERN: &str = "~ALL";

/// Repository role ID GitHub uses for the repository admin role.
pub const REPOSITORY_ADMIN_ROLE_ID: u64 = 5;

/// A repository ruleset.
///
/// `id` is `None` when the ruleset is built locally for creation. Summaries returned by the
/// list endpoint carry neither conditions nor rules; fetch the ruleset by ID to get them.
///
/// # Examples
///
/// ```rust
/// use github_client::{RepositoryRuleset, Rule, RulesetEnforcement, RulesetTarget};
///
/// let ruleset = RepositoryRuleset {
///     id: None,
///     name: "Protect main".to_string(),
///     target: RulesetTarget::Branch,
///     enforcement: RulesetEnforcement::Active,
///     bypass_actors: vec![],
///     conditions: None,
///     rules: vec![Rule::Deletion],
/// };
/// assert!(ruleset.has_rule("deletion"));
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RepositoryRuleset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    pub name: String,

    pub target: RulesetTarget,

    pub enforcement: RulesetEnforcement,

    #[serde(default)]
    pub bypass_actors: Vec<BypassActor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<RulesetConditions>,

    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RepositoryRuleset {
    /// Returns true if the ruleset contains a rule of the given API type, e.g. `"deletion"`.
    pub fn has_rule(&self, rule_type: &str) -> bool {
        self.rules.iter().any(|r| r.rule_type() == rule_type)
    }

    /// Determines whether this ruleset applies to the given branch.
    ///
    /// Only active branch rulesets count. `is_default_branch` tells the matcher whether
    /// `~DEFAULT_BRANCH` refers to `branch`. A ruleset without conditions applies to nothing,
    /// matching the behaviour of the GitHub UI.
    pub fn targets_branch(&self, branch: &str, is_default_branch: bool) -> bool {
        if self.target != RulesetTarget::Branch || self.enforcement != RulesetEnforcement::Active
        {
            return false;
        }

        let Some(conditions) = &self.conditions else {
            return false;
        };

        let ref_name = format!("refs/heads/{}", branch);
        let matches = |pattern: &String| match pattern.as_str() {
            ALL_BRANCHES_PATTERN => true,
            DEFAULT_BRANCH_PATTERN => is_default_branch,
            p => ref_pattern_matches(p, &ref_name),
        };

        conditions.ref_name.include.iter().any(matches)
            && !conditions.ref_name.exclude.iter().any(matches)
    }
}

/// Matches a fnmatch-style ref pattern against a full ref name.
///
/// `*`, `?` and `[...]` stay within one path segment and `**` matches across segments.
/// Patterns without a `refs/` prefix are matched against the branch name. Invalid patterns
/// match nothing.
fn ref_pattern_matches(pattern: &str, ref_name: &str) -> bool {
    let full_pattern = if pattern.starts_with("refs/") {
        pattern.to_string()
    } else {
        format!("refs/heads/{}", pattern)
    };

    match Pattern::new(&full_pattern) {
        Ok(compiled) => compiled.matches_with(
            ref_name,
            MatchOptions {
                require_literal_separator: true,
                ..MatchOptions::default()
            },
        ),
        Err(e) => {
            debug!(pattern, "Ignoring invalid ref pattern: {}", e);
            false
        }
    }
}

/// Target type for a ruleset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RulesetTarget {
    Branch,
    Tag,
    Push,
}

/// Enforcement level for a ruleset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RulesetEnforcement {
    Disabled,
    Active,
    /// Logs violations without blocking them.
    Evaluate,
}

/// Actor who can bypass a ruleset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BypassActor {
    pub actor_id: u64,
    pub actor_type: BypassActorType,
    pub bypass_mode: BypassMode,
}

impl BypassActor {
    /// The repository admin role, allowed to bypass at all times.
    pub fn repository_admin() -> Self {
        Self {
            actor_id: REPOSITORY_ADMIN_ROLE_ID,
            actor_type: BypassActorType::RepositoryRole,
            bypass_mode: BypassMode::Always,
        }
    }
}

/// Type of actor that can bypass a ruleset.
///
/// For `RepositoryRole` the `actor_id` selects the role (admin, maintain, write).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum BypassActorType {
    OrganizationAdmin,
    RepositoryRole,
    Team,
    Integration,
    DeployKey,
}

/// Mode for bypassing a ruleset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BypassMode {
    Always,
    PullRequest,
}

/// Conditions for when a ruleset applies.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RulesetConditions {
    pub ref_name: RefNameCondition,
}

impl RulesetConditions {
    /// Conditions that select only the given ref patterns.
    pub fn include(patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            ref_name: RefNameCondition {
                include: patterns.into_iter().map(Into::into).collect(),
                exclude: vec![],
            },
        }
    }
}

/// Reference name condition.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefNameCondition {
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,
}

/// A rule within a ruleset, tagged by its API `type`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    Creation,
    Update,
    Deletion,
    RequiredLinearHistory,
    RequiredSignatures,
    PullRequest { parameters: PullRequestParameters },
    RequiredStatusChecks { parameters: RequiredStatusChecksParameters },
    NonFastForward,
    /// Any rule type this crate does not model, e.g. `code_scanning`.
    #[serde(other)]
    Unknown,
}

impl Rule {
    /// The `type` string GitHub uses for this rule.
    pub fn rule_type(&self) -> &'static str {
        match self {
            Rule::Creation => "creation",
            Rule::Update => "update",
            Rule::Deletion => "deletion",
            Rule::RequiredLinearHistory => "required_linear_history",
            Rule::RequiredSignatures => "required_signatures",
            Rule::PullRequest { .. } => "pull_request",
            Rule::RequiredStatusChecks { .. } => "required_status_checks",
            Rule::NonFastForward => "non_fast_forward",
            Rule::Unknown => "unknown",
        }
    }
}

/// Parameters for pull request rules.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequestParameters {
    #[serde(default)]
    pub allowed_merge_methods: Vec<MergeMethod>,
    pub dismiss_stale_reviews_on_push: bool,
    pub require_code_owner_review: bool,
    pub require_last_push_approval: bool,
    pub required_approving_review_count: u32,
    pub required_review_thread_resolution: bool,
}

/// Parameters for required status checks.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequiredStatusChecksParameters {
    pub required_status_checks: Vec<StatusCheck>,
    pub strict_required_status_checks_policy: bool,
}

/// A required status check.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCheck {
    pub context: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_id: Option<u64>,
}

/// Allowed merge methods for pull requests.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MergeMethod {
    Merge,
    Squash,
    Rebase,
}
