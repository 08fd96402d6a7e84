//! Credential handling for the repository migrator.
//!
//! Migrations act on repositories owned by many accounts. A [`TokenProvider`] hands out a
//! token that is valid for a given owner, either by exchanging GitHub App credentials for
//! an installation token or by returning a fixed personal token.
//!
//! Tokens are wrapped in [`SecretString`] so they never end up in logs or debug output.

use async_trait::async_trait;
use secrecy::SecretString;

mod github_app_token_provider;
mod static_token_provider;

pub use github_app_token_provider::GitHubAppTokenProvider;
pub use static_token_provider::StaticTokenProvider;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Result type for authentication operations
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while obtaining a token.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The configured credentials cannot be used, e.g. a malformed private key.
    #[error("Invalid credentials provided")]
    InvalidCredentials,

    /// The app has no installation on the requested owner.
    #[error("No GitHub App installation found for '{0}'")]
    InstallationNotFound(String),

    #[error("GitHub API error: {0}")]
    GitHubError(String),
}

/// Supplies tokens that grant access to the repositories of an owner.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a token that can read and write the repositories of `owner`.
    ///
    /// # Errors
    /// Returns `AuthError::InstallationNotFound` if the provider cannot act on `owner`, and
    /// `AuthError::InvalidCredentials` if the configured credentials are unusable.
    async fn token_for_owner(&self, owner: &str) -> AuthResult<SecretString>;
}
