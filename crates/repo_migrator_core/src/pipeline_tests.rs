use super::*;
use crate::errors::ErrorCode;
use crate::migrations::default_registry;
use crate::result::MigrationStatus;
use crate::test_support::{MockPackageRegistry, MockRepositoryClient, MockSourceControl};
use regex::Regex;
use tracing_test::traced_test;

const RELEASE_WORKFLOW: &str = "name: Release
on:
  release:
    types: [published]
jobs:
  publish:
    runs-on: ubuntu-24.04
    steps:
      - uses: actions/checkout@v4
      - run: npm publish
        env:
          NODE_AUTH_TOKEN: ${{ secrets.NPM_TOKEN }}
";

const RELEASE_WORKFLOW_WITHOUT_TOKEN: &str = "name: Release
on:
  release:
    types: [published]
jobs:
  publish:
    runs-on: ubuntu-24.04
    steps:
      - uses: actions/checkout@v4
      - run: npm publish
";

const CI_WORKFLOW: &str = "name: CI
on: push
jobs:
  test:
    runs-on: ubuntu-24.04
    steps:
      - run: npm test
";

const MANIFEST: &str = "{
  \"name\": \"widgets\",
  \"dependencies\": {
    \"express\": \"^4.17.1\"
  }
}
";

async fn run_migration(
    client: &MockRepositoryClient,
    source_control: &MockSourceControl,
    registry: &MockPackageRegistry,
    settings: &MigrationSettings,
    name: &str,
    parameters: &MigrationParameters,
) -> MigrationResult {
    let migrations = default_registry();
    let migration = migrations.get(name).unwrap();
    let token = SecretString::from("test-token".to_string());
    let repository = RepositoryRef::parse("octo/widgets").unwrap();

    MigrationPipeline::new(client, source_control, registry, settings, &token)
        .run(migration.as_ref(), &repository, parameters)
        .await
}

async fn run_remote(client: &MockRepositoryClient, name: &str) -> MigrationResult {
    run_migration(
        client,
        &MockSourceControl::new(vec![]),
        &MockPackageRegistry::new(&[]),
        &MigrationSettings::default(),
        name,
        &MigrationParameters::default(),
    )
    .await
}

// ============================================================================
// Remote acquisition
// ============================================================================

#[tokio::test]
async fn test_remove_npm_token_proposes_only_changed_workflow() {
    let client = MockRepositoryClient::new()
        .with_file(".github/workflows/release.yml", RELEASE_WORKFLOW)
        .with_file(".github/workflows/ci.yml", CI_WORKFLOW);

    let result = run_remote(&client, "remove-npm-token").await;

    assert_eq!(result.status(), MigrationStatus::Success);
    assert_eq!(result.status_code(), 201);
    assert_eq!(
        result.changed_files(),
        &[ChangedFile::modified(
            ".github/workflows/release.yml",
            RELEASE_WORKFLOW_WITHOUT_TOKEN
        )]
    );
    let branch_pattern = Regex::new(r"^remove-npm-token-\d+$").unwrap();
    assert!(branch_pattern.is_match(result.branch_name()));
    assert_eq!(result.commit_message(), "ci: remove NPM_TOKEN from workflows");
    assert_eq!(result.pull_request_title(), "Remove NPM_TOKEN");
}

#[tokio::test]
async fn test_proposal_creates_branch_commits_and_opens_pull_request() {
    let client =
        MockRepositoryClient::new().with_file(".github/workflows/release.yml", RELEASE_WORKFLOW);

    let result = run_remote(&client, "remove-npm-token").await;

    let refs = client.created_refs.lock().unwrap().clone();
    assert_eq!(refs, vec![(result.branch_name().to_string(), "base-sha".to_string())]);

    let updates = client.file_updates.lock().unwrap().clone();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].path, ".github/workflows/release.yml");
    assert_eq!(updates[0].branch, result.branch_name());
    assert_eq!(updates[0].content, RELEASE_WORKFLOW_WITHOUT_TOKEN);
    assert_eq!(updates[0].sha.as_deref(), Some("sha-.github-workflows-release.yml"));

    let pull_requests = client.pull_requests.lock().unwrap().clone();
    assert_eq!(pull_requests.len(), 1);
    assert_eq!(pull_requests[0].head, result.branch_name());
    assert_eq!(pull_requests[0].base, "main");

    let pull_request = result.pull_request().unwrap();
    assert_eq!(pull_request.number, 42);
    assert_eq!(pull_request.url, "https://github.com/octo/widgets/pull/42");
    assert!(!pull_request.auto_merge_enabled);
    assert!(!client.called("enable_auto_merge"));
}

#[tokio::test]
async fn test_no_change_is_empty_result_without_pull_request() {
    let client = MockRepositoryClient::new()
        .with_file(".github/workflows/release.yml", RELEASE_WORKFLOW_WITHOUT_TOKEN)
        .with_file(".github/workflows/ci.yml", CI_WORKFLOW);

    let result = run_remote(&client, "remove-npm-token").await;

    assert_eq!(result, MigrationResult::empty());
    assert_eq!(result.status_code(), 200);
    assert!(!client.called("create_branch_ref"));
    assert!(!client.called("create_or_update_file"));
    assert!(!client.called("create_pull_request"));
}

#[tokio::test]
async fn test_missing_workflow_directory_is_no_op() {
    let client = MockRepositoryClient::new().with_file("README.md", "# widgets\n");

    let result = run_remote(&client, "update-runner-os").await;

    assert_eq!(result, MigrationResult::empty());
    assert!(client.called("list_directory"));
}

#[tokio::test]
async fn test_files_outside_scope_are_not_fetched() {
    let client = MockRepositoryClient::new()
        .with_file(".github/workflows/nested/old.yml", RELEASE_WORKFLOW)
        .with_file(".github/workflows/notes.md", RELEASE_WORKFLOW);

    let result = run_remote(&client, "remove-npm-token").await;

    assert_eq!(result, MigrationResult::empty());
    assert!(!client.called("get_file"));
}

#[tokio::test]
async fn test_missing_single_file_is_no_op() {
    let client = MockRepositoryClient::new();

    let result = run_remote(&client, "update-node-image").await;

    assert_eq!(result, MigrationResult::empty());
    assert_eq!(client.call_count("get_file"), 1);
}

#[tokio::test]
async fn test_fixed_branch_name() {
    let client = MockRepositoryClient::new().with_file("package.json", MANIFEST);

    let result = run_remote(&client, "add-lint-script").await;

    assert_eq!(result.branch_name(), "feature/add-lint-script");
    assert_eq!(result.changed_files()[0].path, "package.json");
}

#[tokio::test]
async fn test_composite_migration_proposes_single_pull_request() {
    let client = MockRepositoryClient::new().with_file(
        ".github/workflows/ci.yml",
        "jobs:\n  test:\n    runs-on: ubuntu-20.04\n    steps:\n      - uses: actions/checkout@v3\n",
    );

    let result = run_remote(&client, "update-github-actions").await;

    assert_eq!(result.status_code(), 201);
    assert_eq!(
        result.changed_files()[0].content,
        "jobs:\n  test:\n    runs-on: ubuntu-24.04\n    steps:\n      - uses: actions/checkout@v4\n"
    );
    assert!(result.branch_name().starts_with("update-github-actions-"));
    assert_eq!(client.call_count("create_pull_request"), 1);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_missing_repository_is_failure() {
    let client = MockRepositoryClient::new().without_repository();

    let result = run_remote(&client, "remove-npm-token").await;

    assert_eq!(result.error_code(), Some(ErrorCode::RemoveNpmTokenFailed));
    assert_eq!(result.status_code(), 424);
    assert!(result.changed_files().is_empty());
}

#[tokio::test]
async fn test_missing_base_branch_is_failure() {
    let client = MockRepositoryClient::new()
        .with_file(".github/workflows/release.yml", RELEASE_WORKFLOW)
        .failing("get_branch_ref", 404);

    let result = run_remote(&client, "remove-npm-token").await;

    assert_eq!(result.error_code(), Some(ErrorCode::RemoveNpmTokenFailed));
    assert_eq!(result.status_code(), 424);
    assert!(result.changed_files().is_empty());
    assert!(!client.called("create_pull_request"));
}

#[tokio::test]
async fn test_permission_denied_is_forbidden() {
    let client = MockRepositoryClient::new()
        .with_file(".github/workflows/release.yml", RELEASE_WORKFLOW)
        .failing("create_or_update_file", 403);

    let result = run_remote(&client, "remove-npm-token").await;

    assert_eq!(result.error_code(), Some(ErrorCode::Forbidden));
    assert_eq!(result.status_code(), 400);
}

// ============================================================================
// Auto-merge
// ============================================================================

#[tokio::test]
async fn test_auto_merge_enabled_when_configured() {
    let client =
        MockRepositoryClient::new().with_file(".github/workflows/release.yml", RELEASE_WORKFLOW);
    let mut settings = MigrationSettings::default();
    settings.pull_requests.auto_merge = true;

    let result = run_migration(
        &client,
        &MockSourceControl::new(vec![]),
        &MockPackageRegistry::new(&[]),
        &settings,
        "remove-npm-token",
        &MigrationParameters::default(),
    )
    .await;

    assert!(result.pull_request().unwrap().auto_merge_enabled);
    assert_eq!(*client.auto_merged.lock().unwrap(), vec!["PR_kwDOA42".to_string()]);
}

#[tokio::test]
#[traced_test]
async fn test_auto_merge_failure_is_not_fatal() {
    let client = MockRepositoryClient::new()
        .with_file(".github/workflows/release.yml", RELEASE_WORKFLOW)
        .failing("enable_auto_merge", 422);
    let mut settings = MigrationSettings::default();
    settings.pull_requests.auto_merge = true;

    let result = run_migration(
        &client,
        &MockSourceControl::new(vec![]),
        &MockPackageRegistry::new(&[]),
        &settings,
        "remove-npm-token",
        &MigrationParameters::default(),
    )
    .await;

    assert_eq!(result.status_code(), 201);
    assert!(!result.pull_request().unwrap().auto_merge_enabled);
    assert!(logs_contain("Failed to enable auto-merge"));
}

// ============================================================================
// Clone acquisition
// ============================================================================

fn dependency_settings() -> MigrationSettings {
    let mut settings = MigrationSettings::default();
    settings
        .dependencies
        .insert("express".to_string(), "4.21.2".to_string());
    settings
}

#[tokio::test]
async fn test_update_dependencies_diffs_cloned_working_copy() {
    let client = MockRepositoryClient::new();
    let source_control = MockSourceControl::new(vec![("package.json", MANIFEST)]);

    let result = run_migration(
        &client,
        &source_control,
        &MockPackageRegistry::new(&[]),
        &dependency_settings(),
        "update-dependencies",
        &MigrationParameters::default(),
    )
    .await;

    assert_eq!(result.status_code(), 201);
    assert_eq!(
        result.changed_files(),
        &[ChangedFile::modified(
            "package.json",
            MANIFEST.replace("^4.17.1", "^4.21.2")
        )]
    );
    assert_eq!(
        *source_control.clones.lock().unwrap(),
        vec![(
            "https://github.com/octo/widgets.git".to_string(),
            "main".to_string()
        )]
    );
    assert!(!client.called("list_directory"));
}

#[tokio::test]
async fn test_update_dependencies_up_to_date_is_no_op() {
    let client = MockRepositoryClient::new();
    let current = MANIFEST.replace("^4.17.1", "^4.21.2");
    let source_control = MockSourceControl::new(vec![("package.json", current.as_str())]);

    let result = run_migration(
        &client,
        &source_control,
        &MockPackageRegistry::new(&[]),
        &dependency_settings(),
        "update-dependencies",
        &MigrationParameters::default(),
    )
    .await;

    assert_eq!(result, MigrationResult::empty());
    assert!(!client.called("create_pull_request"));
}

#[tokio::test]
async fn test_update_single_dependency_resolves_latest() {
    let client = MockRepositoryClient::new();
    let source_control = MockSourceControl::new(vec![("package.json", MANIFEST)]);
    let registry = MockPackageRegistry::new(&[("express", "5.0.1")]);
    let parameters = MigrationParameters {
        dependency: Some("express".to_string()),
    };

    let result = run_migration(
        &client,
        &source_control,
        &registry,
        &MigrationSettings::default(),
        "update-dependencies",
        &parameters,
    )
    .await;

    assert!(result.changed_files()[0].content.contains("\"express\": \"^5.0.1\""));
    assert_eq!(*registry.lookups.lock().unwrap(), vec!["express".to_string()]);
}

#[tokio::test]
async fn test_update_unlisted_dependency_is_not_found() {
    let client = MockRepositoryClient::new();
    let source_control = MockSourceControl::new(vec![("package.json", MANIFEST)]);
    let registry = MockPackageRegistry::new(&[("left-pad", "1.3.0")]);
    let parameters = MigrationParameters {
        dependency: Some("left-pad".to_string()),
    };

    let result = run_migration(
        &client,
        &source_control,
        &registry,
        &MigrationSettings::default(),
        "update-dependencies",
        &parameters,
    )
    .await;

    assert_eq!(result.error_code(), Some(ErrorCode::DependencyNotFound));
    assert_eq!(result.status_code(), 400);
}

#[tokio::test]
async fn test_clone_failure_is_migration_failure() {
    let client = MockRepositoryClient::new();

    let result = run_migration(
        &client,
        &MockSourceControl::failing(),
        &MockPackageRegistry::new(&[]),
        &dependency_settings(),
        "update-dependencies",
        &MigrationParameters::default(),
    )
    .await;

    assert_eq!(result.error_code(), Some(ErrorCode::UpdateDependenciesFailed));
    assert_eq!(result.status_code(), 424);
}

// ============================================================================
// diff
// ============================================================================

#[test]
fn test_diff_ignores_unchanged_and_out_of_scope_files() {
    let input: FileSet = [
        ("Dockerfile".to_string(), "FROM node:18\n".to_string()),
        ("README.md".to_string(), "a".to_string()),
    ]
    .into();
    let output: FileSet = [
        ("Dockerfile".to_string(), "FROM node:18\n".to_string()),
        ("README.md".to_string(), "b".to_string()),
    ]
    .into();

    assert!(diff(&input, &output, &[Scope::File("Dockerfile")]).is_empty());
}
