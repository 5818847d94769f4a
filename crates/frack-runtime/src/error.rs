//! Runtime error types.

use thiserror::Error;
use tracing_subscriber::util::TryInitError;

use crate::config::ConfigError;

/// Errors that can occur while setting up an application.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A global tracing subscriber is already installed.
    #[error("cannot install log subscriber: {0}")]
    Logging(#[from] TryInitError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
