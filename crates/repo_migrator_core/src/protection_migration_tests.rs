use super::*;
use crate::test_support::MockRepositoryClient;
use github_client::{
    ClassicBranchProtection, ClassicStatusChecks, EnabledSetting, Rule, RulesetConditions,
    RulesetEnforcement, RulesetTarget,
};
use std::sync::atomic::Ordering;

fn repo() -> RepositoryRef {
    RepositoryRef::parse("octo/widgets").unwrap()
}

fn ruleset(id: u64, include: &str) -> RepositoryRuleset {
    RepositoryRuleset {
        id: Some(id),
        name: format!("ruleset-{}", id),
        target: RulesetTarget::Branch,
        enforcement: RulesetEnforcement::Active,
        bypass_actors: vec![],
        conditions: Some(RulesetConditions::include([include])),
        rules: vec![Rule::Deletion],
    }
}

fn classic() -> ClassicBranchProtection {
    ClassicBranchProtection {
        required_status_checks: Some(ClassicStatusChecks {
            strict: true,
            contexts: vec!["ci/test".to_string()],
        }),
        enforce_admins: Some(EnabledSetting { enabled: true }),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_converts_classic_protection_and_deletes_it() {
    let client = MockRepositoryClient::new().with_protection(classic());

    let result = modernize_branch_protection(&client, &repo(), None).await;

    assert!(!result.is_error(), "{:?}", result);
    let created = client.created_rulesets.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].name, "Protect main");
    assert!(created[0].has_rule("required_status_checks"));
    assert!(client.protection_deleted.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_unprotected_branch_gets_default_ruleset() {
    let client = MockRepositoryClient::new();

    let result = modernize_branch_protection(&client, &repo(), Some("main")).await;

    assert!(!result.is_error());
    let created = client.created_rulesets.lock().unwrap();
    assert_eq!(created[0], default_ruleset("main"));
    assert!(!client.called("delete_branch_protection"));
}

#[tokio::test]
async fn test_existing_ruleset_is_noop() {
    let client = MockRepositoryClient::new()
        .with_protection(classic())
        .with_ruleset(ruleset(7, "~DEFAULT_BRANCH"));

    let result = modernize_branch_protection(&client, &repo(), None).await;

    assert_eq!(result, MigrationResult::empty());
    assert!(!client.called("create_ruleset"));
    assert!(!client.called("delete_branch_protection"));
}

#[tokio::test]
async fn test_ruleset_with_wildcard_pattern_is_noop() {
    let client = MockRepositoryClient::new()
        .with_protection(classic())
        .with_ruleset(ruleset(7, "refs/heads/ma[a-z]?"));

    let result = modernize_branch_protection(&client, &repo(), None).await;

    assert_eq!(result, MigrationResult::empty());
    assert!(!client.called("create_ruleset"));
    assert!(!client.called("delete_branch_protection"));
}

#[tokio::test]
async fn test_ruleset_for_other_branch_does_not_count() {
    let client = MockRepositoryClient::new().with_ruleset(ruleset(7, "refs/heads/release/*"));

    let result = modernize_branch_protection(&client, &repo(), None).await;

    assert!(!result.is_error());
    assert_eq!(client.call_count("create_ruleset"), 1);
}

#[tokio::test]
async fn test_non_default_branch_is_validation_error() {
    let client = MockRepositoryClient::new();

    let result = modernize_branch_protection(&client, &repo(), Some("develop")).await;

    assert_eq!(result.error_code(), Some(ErrorCode::ValidationError));
    assert_eq!(result.status_code(), 400);
    assert!(!client.called("create_ruleset"));
}

#[tokio::test]
async fn test_create_failure_keeps_classic_protection() {
    let client = MockRepositoryClient::new()
        .with_protection(classic())
        .failing("create_ruleset", 422);

    let result = modernize_branch_protection(&client, &repo(), None).await;

    assert_eq!(result.error_code(), Some(ErrorCode::CreateRulesetFailed));
    assert_eq!(result.status_code(), 424);
    assert!(!client.called("delete_branch_protection"));
}

#[tokio::test]
async fn test_delete_failure_does_not_roll_back() {
    let client = MockRepositoryClient::new()
        .with_protection(classic())
        .failing("delete_branch_protection", 500);

    let result = modernize_branch_protection(&client, &repo(), None).await;

    assert_eq!(
        result.error_code(),
        Some(ErrorCode::DeleteClassicProtectionFailed)
    );
    assert_eq!(client.created_rulesets.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_repository_fails() {
    let client = MockRepositoryClient::new().without_repository();

    let result = modernize_branch_protection(&client, &repo(), None).await;

    assert_eq!(
        result.error_code(),
        Some(ErrorCode::ModernizeBranchProtectionFailed)
    );
}

#[tokio::test]
async fn test_forbidden_create_reports_forbidden() {
    let client = MockRepositoryClient::new().failing("create_ruleset", 403);

    let result = modernize_branch_protection(&client, &repo(), None).await;

    assert_eq!(result.error_code(), Some(ErrorCode::Forbidden));
    assert_eq!(result.status_code(), 400);
}
