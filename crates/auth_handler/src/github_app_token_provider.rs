//! GitHub App installation token provider.

use crate::{AuthError, AuthResult, TokenProvider};
use async_trait::async_trait;
use github_client::{create_app_client, GitHubClient};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, instrument};

#[cfg(test)]
#[path = "github_app_token_provider_tests.rs"]
mod tests;

/// Exchanges GitHub App credentials for installation tokens.
///
/// A fresh token is requested for every call; installation tokens expire after an hour and
/// migrations are short-lived.
///
/// # Examples
///
/// ```rust,no_run
/// use auth_handler::{GitHubAppTokenProvider, TokenProvider};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let private_key = std::fs::read_to_string("app-key.pem")?;
/// let provider = GitHubAppTokenProvider::new(12345, private_key.into());
///
/// let token = provider.token_for_owner("my-org").await?;
/// # Ok(())
/// # }
/// ```
pub struct GitHubAppTokenProvider {
    app_id: u64,
    private_key: SecretString,
}

impl GitHubAppTokenProvider {
    /// Creates a provider for the app with the given ID and PEM encoded private key.
    pub fn new(app_id: u64, private_key: SecretString) -> Self {
        Self {
            app_id,
            private_key,
        }
    }
}

#[async_trait]
impl TokenProvider for GitHubAppTokenProvider {
    #[instrument(skip(self), fields(app_id = self.app_id))]
    async fn token_for_owner(&self, owner: &str) -> AuthResult<SecretString> {
        let app_client = create_app_client(self.app_id, self.private_key.expose_secret())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to create GitHub App client");
                AuthError::InvalidCredentials
            })?;

        let client = GitHubClient::new(app_client);
        let token = client
            .get_installation_token(owner)
            .await
            .map_err(|e| match e {
                github_client::Error::NotFound => AuthError::InstallationNotFound(owner.to_string()),
                other => AuthError::GitHubError(format!(
                    "Failed to get installation token for '{}': {}",
                    owner, other
                )),
            })?;

        debug!(owner = owner, "Obtained installation token");
        Ok(token)
    }
}

impl std::fmt::Debug for GitHubAppTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubAppTokenProvider")
            .field("app_id", &self.app_id)
            .field("private_key", &"<REDACTED>")
            .finish()
    }
}
