//! Error types for GitHub client operations.
//!
//! This module defines the error types that can occur when interacting with the GitHub API
//! through the github_client crate. Callers that probe for optional resources should match
//! on [`Error::NotFound`] instead of inspecting status codes themselves; the client already
//! turns a 404 into `Ok(None)` for the calls where absence is an expected answer.

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur during GitHub client operations.
///
/// ## Examples
///
/// ```rust,ignore
/// use github_client::Error;
///
/// match client.get_branch_ref("owner", "repo", "main").await {
///     Ok(reference) => println!("main is at {}", reference.sha),
///     Err(Error::NotFound) => eprintln!("The base branch does not exist"),
///     Err(Error::Forbidden(msg)) => eprintln!("The token lacks permissions: {}", msg),
///     Err(err) => eprintln!("Other error: {}", err),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The GitHub API answered with a status that is neither success, 403 nor 404.
    #[error("GitHub API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    /// Authentication or GitHub client initialization failure.
    ///
    /// The contained string provides specific details about the authentication failure.
    #[error("Failed to authenticate or initialize GitHub client: {0}")]
    AuthError(String),

    /// Error deserializing the response from GitHub.
    #[error("Failed to deserialize GitHub response: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The token is valid but is not allowed to perform the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The GitHub API returned a response in an unexpected format.
    #[error("Invalid response format")]
    InvalidResponse,

    /// The requested resource was not found.
    ///
    /// Only returned for resources that are required for the operation to continue,
    /// e.g. the ref of a base branch.
    #[error("Resource not found")]
    NotFound,

    /// The request could not be sent, e.g. because of a network failure.
    #[error("Failed to send request to GitHub: {0}")]
    Transport(String),
}

impl Error {
    /// Returns the HTTP status associated with the error, if there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Forbidden(_) => Some(403),
            Error::NotFound => Some(404),
            _ => None,
        }
    }

    /// Classifies an octocrab error by the HTTP status GitHub returned.
    pub(crate) fn from_octocrab(e: &octocrab::Error) -> Self {
        match e {
            octocrab::Error::GitHub { source, .. } => match source.status_code.as_u16() {
                404 => Error::NotFound,
                403 => Error::Forbidden(source.message.clone()),
                status => Error::Api {
                    status,
                    message: source.message.clone(),
                },
            },
            other => Error::Transport(other.to_string()),
        }
    }
}
