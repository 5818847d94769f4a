//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly given config file does not exist.
    #[error("config file {0} does not exist")]
    FileNotFound(PathBuf),

    /// No enabled format handles this extension.
    #[error("cannot read .{0} config files (is the matching feature enabled?)")]
    UnsupportedFormat(String),

    #[error("cannot extract configuration: {0}")]
    Extract(#[source] Box<figment::Error>),

    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },

    /// A setting that another setting depends on is absent.
    #[error("`{key}` must be set")]
    MissingField { key: &'static str },
}

impl ConfigError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }

    pub fn missing(key: &'static str) -> Self {
        Self::MissingField { key }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Extract(Box::new(err))
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
