//! Service configuration read from the environment.
//!
//! # Environment Variables
//!
//! - `API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `API_PORT`: Port to listen on (default: 8080)
//! - `MIGRATOR_SECRET`: Shared secret every trigger endpoint requires (required)
//! - `WEBHOOK_SECRET`: Secret used to sign release webhooks
//! - `GITHUB_APP_ID` + `GITHUB_APP_PRIVATE_KEY`: GitHub App credentials
//! - `GITHUB_TOKEN`: Personal token, used when no app credentials are set
//! - `MIGRATION_CONFIG`: Path of the migration settings file
//! - `DEFAULT_OWNER`: Owner assumed for repository names without one
//! - `LOG_FORMAT`: `json` for JSON logs, anything else for plain text

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

use crate::DEFAULT_PORT;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Errors in the service configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable '{0}'")]
    Missing(&'static str),

    #[error("Invalid value for '{name}': {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// How the service authenticates against GitHub.
#[derive(Debug, Clone)]
pub enum Credentials {
    GitHubApp {
        app_id: u64,
        private_key: SecretString,
    },
    Token(SecretString),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub secret: SecretString,
    pub webhook_secret: Option<SecretString>,
    pub credentials: Credentials,
    pub migration_config: Option<PathBuf>,
    pub default_owner: Option<String>,
    pub log_format: LogFormat,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from `lookup`, which returns the value of a variable.
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match get("API_PORT") {
            Some(port) => port.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "API_PORT",
                reason: format!("'{}' is not a port number", port),
            })?,
            None => DEFAULT_PORT,
        };

        let secret = get("MIGRATOR_SECRET")
            .map(SecretString::from)
            .ok_or(ConfigError::Missing("MIGRATOR_SECRET"))?;

        let credentials = match (get("GITHUB_APP_ID"), get("GITHUB_APP_PRIVATE_KEY")) {
            (Some(app_id), Some(private_key)) => Credentials::GitHubApp {
                app_id: app_id.trim().parse().map_err(|_| ConfigError::Invalid {
                    name: "GITHUB_APP_ID",
                    reason: format!("'{}' is not a number", app_id),
                })?,
                // Keys passed through a single-line variable carry escaped newlines.
                private_key: SecretString::from(private_key.replace("\\n", "\n")),
            },
            (Some(_), None) => return Err(ConfigError::Missing("GITHUB_APP_PRIVATE_KEY")),
            (None, Some(_)) => return Err(ConfigError::Missing("GITHUB_APP_ID")),
            (None, None) => Credentials::Token(
                get("GITHUB_TOKEN")
                    .map(SecretString::from)
                    .ok_or(ConfigError::Missing("GITHUB_TOKEN"))?,
            ),
        };

        let log_format = match get("LOG_FORMAT") {
            Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            host: get("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            secret,
            webhook_secret: get("WEBHOOK_SECRET").map(SecretString::from),
            credentials,
            migration_config: get("MIGRATION_CONFIG").map(PathBuf::from),
            default_owner: get("DEFAULT_OWNER"),
            log_format,
        })
    }
}
