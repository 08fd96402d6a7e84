//! Tests for repository identification types

use super::*;

#[test]
fn test_repository_name_valid() {
    assert!(RepositoryName::new("my-repo").is_ok());
    assert!(RepositoryName::new("my_repo").is_ok());
    assert!(RepositoryName::new("my.repo").is_ok());
    assert!(RepositoryName::new("MyRepo123").is_ok());
}

#[test]
fn test_repository_name_invalid() {
    assert!(RepositoryName::new(".starts-with-dot").is_err());
    assert!(RepositoryName::new("-starts-with-dash").is_err());
    assert!(RepositoryName::new("").is_err());
    assert!(RepositoryName::new("a".repeat(101)).is_err());
    assert!(RepositoryName::new("invalid space").is_err());
    assert!(RepositoryName::new("nested/path").is_err());
}

#[test]
fn test_owner_name_valid() {
    assert!(OwnerName::new("my-org").is_ok());
    assert!(OwnerName::new("MyOrg").is_ok());
    assert!(OwnerName::new("org123").is_ok());
}

#[test]
fn test_owner_name_invalid() {
    assert!(OwnerName::new("-starts-with-dash").is_err());
    assert!(OwnerName::new("ends-with-dash-").is_err());
    assert!(OwnerName::new("").is_err());
    assert!(OwnerName::new("a".repeat(40)).is_err());
    assert!(OwnerName::new("invalid_underscore").is_err());
}

#[test]
fn test_parse_full_name() {
    let repo = RepositoryRef::parse("octo/widgets").unwrap();

    assert_eq!(repo.owner(), "octo");
    assert_eq!(repo.name(), "widgets");
}

#[test]
fn test_parse_trims_whitespace() {
    let repo = RepositoryRef::parse("  octo/widgets ").unwrap();

    assert_eq!(repo.to_string(), "octo/widgets");
}

#[test]
fn test_parse_bare_name_requires_default_owner() {
    let result = RepositoryRef::parse("widgets");

    assert!(matches!(
        result,
        Err(ValidationError::InvalidFormat { field, .. }) if field == "repository"
    ));
}

#[test]
fn test_parse_bare_name_with_default_owner() {
    let repo = RepositoryRef::parse_with_default_owner("widgets", Some("octo")).unwrap();

    assert_eq!(repo.owner(), "octo");
}

#[test]
fn test_explicit_owner_beats_default_owner() {
    let repo = RepositoryRef::parse_with_default_owner("acme/widgets", Some("octo")).unwrap();

    assert_eq!(repo.owner(), "acme");
}

#[test]
fn test_parse_empty_is_rejected() {
    assert_eq!(
        RepositoryRef::parse(""),
        Err(ValidationError::empty_field("repository"))
    );
}

#[test]
fn test_parse_extra_segments_are_rejected() {
    assert!(RepositoryRef::parse("octo/widgets/extra").is_err());
}
