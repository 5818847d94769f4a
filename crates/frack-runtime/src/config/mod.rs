//! Configuration module for Frack runtime.
//!
//! Layered loading (defaults, files, `FRACK_*` environment variables) and
//! validation of the logging and pipeline settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, ENV_PREFIX, PROFILE_ENV, load_config, load_config_from_file};
pub use schema::{
    FrackConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, MiddlewareKind,
    PipelineConfig, SpanEventConfig,
};
pub use validation::validate_config;
