//! Failure taxonomy shared by the catalog and rate fetchers.

use thiserror::Error;

/// Why a fetch against the rate service failed.
///
/// The `Display` text of each variant is the message shown to the user, so
/// callers forward it as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Transport error before a usable response arrived (refused, timed out, reset).
    #[error("Failed to reach rate service: {0}")]
    Network(String),

    /// Non-success status, or a catalog body that is empty or does not match the schema.
    #[error("Unexpected response from rate service: {0}")]
    Response(String),

    #[error("Empty response body")]
    EmptyBody,

    /// Body is not valid JSON or lacks the expected field.
    #[error("Error parsing JSON: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FetchError {
    /// The request URL is dropped since it carries the API key.
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.without_url().to_string())
    }
}
