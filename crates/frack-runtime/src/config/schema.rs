//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FrackConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// The middleware chain built around the application's handler.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

// =============================================================================
// Logging
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Global log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Output destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Log file, required when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// How often the log file is rolled over.
    #[serde(default)]
    pub rotation: LogRotation,

    /// Include thread IDs in log lines.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line in log lines.
    #[serde(default)]
    pub file_location: bool,

    /// Which span lifecycle events to log.
    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Per-module level overrides, e.g. `frack_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Newline-delimited JSON. Needs the `json-log` feature; without it the
    /// full format is used.
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Log file rollover schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Span lifecycle events to log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

impl SpanEventConfig {
    pub const NONE: Self = Self {
        new: false,
        enter: false,
        exit: false,
        close: false,
    };

    /// Creation and close, i.e. one line when a request starts and one with
    /// its busy/idle time when it ends.
    pub const LIFECYCLE: Self = Self {
        new: true,
        close: true,
        ..Self::NONE
    };

    /// Enter and exit. An async stage is entered on every poll.
    pub const ACTIVE: Self = Self {
        enter: true,
        exit: true,
        ..Self::NONE
    };

    pub const FULL: Self = Self {
        new: true,
        enter: true,
        exit: true,
        close: true,
    };
}

// =============================================================================
// Pipeline
// =============================================================================

/// The configured middleware chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Route label attached to request logs.
    #[serde(default = "default_route_name")]
    pub name: Option<String>,

    /// Middleware, outermost first.
    #[serde(default = "default_middleware")]
    pub middleware: Vec<MiddlewareKind>,

    /// Deadline for the `timeout` middleware, in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl PipelineConfig {
    /// The configured deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: default_route_name(),
            middleware: default_middleware(),
            timeout_ms: None,
        }
    }
}

fn default_route_name() -> Option<String> {
    Some("{*page}".to_string())
}

fn default_middleware() -> Vec<MiddlewareKind> {
    vec![MiddlewareKind::Log, MiddlewareKind::Head]
}

/// A built-in middleware that can be named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiddlewareKind {
    Log,
    Head,
    CatchPanic,
    Buffer,
    Timeout,
}

impl MiddlewareKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Head => "head",
            Self::CatchPanic => "catch_panic",
            Self::Buffer => "buffer",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for MiddlewareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
