//! Error types for the Frack framework.

use frack_core::Failure;
use thiserror::Error;

/// Errors that can occur while pulling a handler argument out of a request.
///
/// Always surfaces to callers as a [`Failure`].
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The body was not valid JSON for the expected type.
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// The body was not valid UTF-8.
    #[error("body is not valid UTF-8")]
    InvalidUtf8(#[source] std::string::FromUtf8Error),

    /// Custom extraction error.
    #[error("{0}")]
    Custom(String),
}

impl ExtractError {
    /// Creates a custom extraction error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

impl From<ExtractError> for Failure {
    fn from(err: ExtractError) -> Self {
        Failure::new(err)
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;
