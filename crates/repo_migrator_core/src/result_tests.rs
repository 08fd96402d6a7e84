use super::*;
use serde_json::json;

fn proposal(files: Vec<ChangedFile>, branch: &str) -> MigrationResult {
    MigrationResult::proposed(files, branch, "chore: update", "Update", None)
}

#[test]
fn test_empty_result_is_200() {
    let result = MigrationResult::empty();

    assert_eq!(result.status_code(), 200);
    assert!(result.is_noop());
    assert_eq!(result.branch_name(), "");
    assert_eq!(result.commit_message(), "");
    assert_eq!(result.pull_request_title(), "");
}

#[test]
fn test_changed_files_with_branch_is_201() {
    let result = proposal(vec![ChangedFile::modified("a.yml", "x")], "update-1");

    assert_eq!(result.status_code(), 201);
}

#[test]
fn test_changed_files_without_branch_is_200() {
    let result = proposal(vec![ChangedFile::modified("a.yml", "x")], "");

    assert_eq!(result.status_code(), 200);
}

#[test]
fn test_client_error_codes_are_400() {
    for code in [
        ErrorCode::DependencyNotFound,
        ErrorCode::Forbidden,
        ErrorCode::ValidationError,
    ] {
        assert_eq!(MigrationResult::failure(code, "x").status_code(), 400);
    }
}

#[test]
fn test_other_error_codes_are_424() {
    for code in [
        ErrorCode::UpdateRunnerOsFailed,
        ErrorCode::CreateRulesetFailed,
        ErrorCode::DeleteClassicProtectionFailed,
    ] {
        assert_eq!(MigrationResult::failure(code, "x").status_code(), 424);
    }
}

#[test]
fn test_error_result_has_no_changed_files() {
    let error = MigrationError::GitOperation("boom".to_string());

    let result = MigrationResult::from_error(&error, ErrorCode::UpdateDependenciesFailed);

    assert!(result.is_error());
    assert!(result.changed_files().is_empty());
    assert_eq!(result.error_code(), Some(ErrorCode::UpdateDependenciesFailed));
    assert_eq!(result.error_message(), Some("Git operation failed: boom"));
}

#[test]
fn test_aggregate_first_error_wins() {
    let results = vec![
        proposal(vec![ChangedFile::modified("a", "1")], "b-1"),
        MigrationResult::failure(ErrorCode::RemoveNpmTokenFailed, "first"),
        MigrationResult::failure(ErrorCode::UpdateRunnerOsFailed, "second"),
    ];

    let combined = MigrationResult::aggregate(results);

    assert_eq!(combined.error_code(), Some(ErrorCode::RemoveNpmTokenFailed));
    assert_eq!(combined.error_message(), Some("first"));
}

#[test]
fn test_aggregate_successes_concatenates_files() {
    let results = vec![
        MigrationResult::empty(),
        proposal(vec![ChangedFile::modified("a", "1")], "b-1"),
        proposal(vec![ChangedFile::modified("b", "2")], "b-2"),
    ];

    let combined = MigrationResult::aggregate(results);

    assert!(!combined.is_error());
    assert_eq!(combined.changed_files().len(), 2);
    assert_eq!(combined.branch_name(), "b-1");
    assert_eq!(combined.status_code(), 201);
}

#[test]
fn test_aggregate_of_nothing_is_empty() {
    assert_eq!(
        MigrationResult::aggregate(Vec::new()),
        MigrationResult::empty()
    );
}

#[test]
fn test_serialization_shape() {
    let result = MigrationResult::proposed(
        vec![
            ChangedFile::modified(".github/workflows/ci.yml", "on: push\n"),
            ChangedFile::deleted(".npmrc"),
        ],
        "remove-npm-token-1",
        "chore: remove NPM_TOKEN",
        "Remove NPM_TOKEN",
        Some(PullRequestInfo {
            number: 3,
            url: "https://github.com/o/r/pull/3".to_string(),
            auto_merge_enabled: true,
        }),
    );

    let value = serde_json::to_value(&result).unwrap();

    assert_eq!(value["status"], "success");
    assert_eq!(value["statusCode"], 201);
    assert_eq!(value["branchName"], "remove-npm-token-1");
    assert_eq!(
        value["changedFiles"][0],
        json!({ "path": ".github/workflows/ci.yml", "content": "on: push\n" })
    );
    assert_eq!(value["changedFiles"][1]["type"], "deleted");
    assert_eq!(value["pullRequest"]["autoMergeEnabled"], true);
    assert!(value.get("errorCode").is_none());
}

#[test]
fn test_error_serialization() {
    let result = MigrationResult::failure(ErrorCode::CreateRulesetFailed, "422");

    let value = serde_json::to_value(&result).unwrap();

    assert_eq!(value["status"], "error");
    assert_eq!(value["errorCode"], "CREATE_RULESET_FAILED");
    assert_eq!(value["statusCode"], 424);
    assert_eq!(value["changedFiles"], json!([]));
}
