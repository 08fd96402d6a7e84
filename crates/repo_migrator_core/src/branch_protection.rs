//! Conversion of classic branch protection into a repository ruleset.
//!
//! Each classic setting maps onto at most one rule. The rules are emitted in a fixed order:
//!
//! 1. `pull_request`, when reviews are required
//! 2. `required_status_checks`, when status checks are required
//! 3. `non_fast_forward` and `required_linear_history`, always
//! 4. `deletion`, unless deletions are allowed
//!
//! The produced ruleset always targets the default branch through `~DEFAULT_BRANCH`.

use github_client::{
    BypassActor, ClassicBranchProtection, MergeMethod, PullRequestParameters,
    RepositoryRuleset, RequiredStatusChecksParameters, Rule, RulesetConditions,
    RulesetEnforcement, RulesetTarget, StatusCheck, DEFAULT_BRANCH_PATTERN,
    GITHUB_ACTIONS_INTEGRATION_ID,
};

use crate::errors::ValidationError;

#[cfg(test)]
#[path = "branch_protection_tests.rs"]
mod tests;

/// Name given to the ruleset that replaces the protection of `branch`.
pub fn ruleset_name(branch: &str) -> String {
    format!("Protect {}", branch)
}

/// Converts a classic protection of `branch` into an equivalent ruleset.
///
/// # Examples
///
/// ```rust
/// use github_client::{ClassicBranchProtection, ClassicStatusChecks};
/// use repo_migrator_core::convert;
///
/// let classic = ClassicBranchProtection {
///     required_status_checks: Some(ClassicStatusChecks {
///         strict: true,
///         contexts: vec!["ci/test".to_string()],
///     }),
///     ..Default::default()
/// };
///
/// let ruleset = convert(&classic, "main");
/// assert_eq!(ruleset.name, "Protect main");
/// assert!(ruleset.has_rule("required_status_checks"));
/// assert!(ruleset.has_rule("deletion"));
/// ```
pub fn convert(classic: &ClassicBranchProtection, branch: &str) -> RepositoryRuleset {
    let mut rules = Vec::new();

    if let Some(reviews) = &classic.required_pull_request_reviews {
        rules.push(Rule::PullRequest {
            parameters: PullRequestParameters {
                allowed_merge_methods: vec![MergeMethod::Squash],
                dismiss_stale_reviews_on_push: reviews.dismiss_stale_reviews,
                require_code_owner_review: reviews.require_code_owner_reviews,
                require_last_push_approval: false,
                required_approving_review_count: reviews.required_approving_review_count,
                required_review_thread_resolution: classic
                    .required_conversation_resolution
                    .map(|s| s.enabled)
                    .unwrap_or(false),
            },
        });
    }

    if let Some(checks) = &classic.required_status_checks {
        rules.push(Rule::RequiredStatusChecks {
            parameters: RequiredStatusChecksParameters {
                required_status_checks: checks
                    .contexts
                    .iter()
                    .map(|context| StatusCheck {
                        context: context.clone(),
                        integration_id: Some(GITHUB_ACTIONS_INTEGRATION_ID),
                    })
                    .collect(),
                strict_required_status_checks_policy: checks.strict,
            },
        });
    }

    rules.push(Rule::NonFastForward);
    rules.push(Rule::RequiredLinearHistory);

    let deletions_allowed = classic.allow_deletions.map(|s| s.enabled).unwrap_or(false);
    if !deletions_allowed {
        rules.push(Rule::Deletion);
    }

    let admins_exempt = matches!(classic.enforce_admins, Some(setting) if !setting.enabled);
    let bypass_actors = if admins_exempt {
        vec![BypassActor::repository_admin()]
    } else {
        vec![]
    };

    RepositoryRuleset {
        id: None,
        name: ruleset_name(branch),
        target: RulesetTarget::Branch,
        enforcement: RulesetEnforcement::Active,
        bypass_actors,
        conditions: Some(RulesetConditions::include([DEFAULT_BRANCH_PATTERN])),
        rules,
    }
}

/// The ruleset created for a branch that has no classic protection.
pub fn default_ruleset(branch: &str) -> RepositoryRuleset {
    RepositoryRuleset {
        id: None,
        name: ruleset_name(branch),
        target: RulesetTarget::Branch,
        enforcement: RulesetEnforcement::Active,
        bypass_actors: vec![],
        conditions: Some(RulesetConditions::include([DEFAULT_BRANCH_PATTERN])),
        rules: vec![
            Rule::NonFastForward,
            Rule::RequiredLinearHistory,
            Rule::Deletion,
        ],
    }
}

/// Converts classic protection given as raw JSON.
///
/// # Errors
/// Returns a `ValidationError` naming the offending field when the JSON does not have the
/// classic protection shape.
pub fn convert_json(
    classic: &serde_json::Value,
    branch: &str,
) -> Result<RepositoryRuleset, ValidationError> {
    if !classic.is_object() {
        return Err(ValidationError::invalid_format(
            "branch_protection",
            "expected a JSON object",
        ));
    }

    let parsed: ClassicBranchProtection = serde_json::from_value(classic.clone())
        .map_err(|e| ValidationError::invalid_format("branch_protection", e.to_string()))?;

    Ok(convert(&parsed, branch))
}
