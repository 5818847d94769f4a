//! Global `tracing` subscriber for Frack applications.
//!
//! The `log` middleware only emits events; what happens to them is decided
//! here, from the `[logging]` section of the configuration:
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "compact"        # compact|full|pretty|json
//! output = "file"           # stdout|stderr|file
//! file_path = "logs/frack.log"
//! rotation = "daily"        # never|hourly|daily
//! span_events = { new = true, close = true }
//!
//! [logging.filters]
//! frack_framework = "debug"
//! ```
//!
//! `RUST_LOG`, when set, replaces `level`. Entries in `filters` apply on top
//! of either.
//!
//! ```rust,ignore
//! LoggingBuilder::new()
//!     .level(LogLevel::Debug)
//!     .span_events(SpanEventConfig::LIFECYCLE)
//!     .directive("tower=warn")
//!     .init();
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::warn;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, SpanEventConfig};

const DEFAULT_LOG_FILE: &str = "frack.log";

impl From<SpanEventConfig> for FmtSpan {
    fn from(events: SpanEventConfig) -> Self {
        [
            (events.new, FmtSpan::NEW),
            (events.enter, FmtSpan::ENTER),
            (events.exit, FmtSpan::EXIT),
            (events.close, FmtSpan::CLOSE),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .fold(FmtSpan::NONE, |acc, (_, span)| acc | span)
    }
}

/// Installs a subscriber for `config`, unless one is already installed.
pub fn init_from_config(config: &LoggingConfig) {
    LoggingBuilder::from_config(config).init();
}

/// Builds and installs the global subscriber.
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    config: LoggingConfig,
    directives: Vec<String>,
    with_target: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingBuilder {
    /// `info` level, compact lines on stdout, no span events.
    pub fn new() -> Self {
        Self::from_config(&LoggingConfig::default())
    }

    /// Every setting from `config`; each `filters` entry becomes a directive.
    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut directives: Vec<String> = config
            .filters
            .iter()
            .map(|(target, level)| format!("{target}={level}"))
            .collect();
        directives.sort();

        Self {
            config: config.clone(),
            directives,
            with_target: true,
        }
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    /// Adds a filter directive such as `"frack_framework=trace"`.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    pub fn span_events(mut self, events: SpanEventConfig) -> Self {
        self.config.span_events = events;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.config.output = output;
        self
    }

    /// Log file for [`LogOutput::File`].
    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.file_path = Some(path.into());
        self
    }

    pub fn rotation(mut self, rotation: LogRotation) -> Self {
        self.config.rotation = rotation;
        self
    }

    pub fn thread_ids(mut self, enabled: bool) -> Self {
        self.config.thread_ids = enabled;
        self
    }

    /// Source file and line number on every line.
    pub fn file_location(mut self, enabled: bool) -> Self {
        self.config.file_location = enabled;
        self
    }

    /// Module path on every line. On by default.
    pub fn target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Installs the subscriber. A subscriber installed earlier is kept.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Installs the subscriber, failing if one is already installed.
    ///
    /// Settings that had to be ignored are logged as warnings through the
    /// new subscriber.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let mut ignored = Vec::new();
        let filter = self.filter(&mut ignored);
        let layer = self.layer(&mut ignored);
        tracing_subscriber::registry()
            .with(layer)
            .with(filter)
            .try_init()?;

        for problem in ignored {
            warn!("{problem}");
        }
        Ok(())
    }

    fn filter(&self, ignored: &mut Vec<String>) -> EnvFilter {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.config.level.as_str()));
        for directive in &self.directives {
            match directive.parse() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(e) => {
                    ignored.push(format!("Ignoring invalid log directive {directive:?}: {e}"));
                }
            }
        }
        filter
    }

    fn layer(&self, ignored: &mut Vec<String>) -> Box<dyn Layer<Registry> + Send + Sync> {
        let base = fmt::layer()
            .with_writer(self.writer(ignored))
            .with_span_events(self.config.span_events.into())
            .with_target(self.with_target)
            .with_thread_ids(self.config.thread_ids)
            .with_file(self.config.file_location)
            .with_line_number(self.config.file_location);

        match self.config.format {
            LogFormat::Compact => base.compact().boxed(),
            LogFormat::Pretty => base.pretty().boxed(),
            #[cfg(feature = "json-log")]
            LogFormat::Json => base.json().boxed(),
            #[cfg(not(feature = "json-log"))]
            LogFormat::Json => base.boxed(),
            LogFormat::Full => base.boxed(),
        }
    }

    fn writer(&self, ignored: &mut Vec<String>) -> BoxMakeWriter {
        match (self.config.output, self.config.file_path.as_deref()) {
            (LogOutput::Stdout, _) => BoxMakeWriter::new(std::io::stdout),
            (LogOutput::Stderr, _) => BoxMakeWriter::new(std::io::stderr),
            (LogOutput::File, Some(path)) => {
                BoxMakeWriter::new(file_appender(path, self.config.rotation))
            }
            (LogOutput::File, None) => {
                ignored.push(
                    "Log output is \"file\" but no file_path is set, logging to stdout".to_string(),
                );
                BoxMakeWriter::new(std::io::stdout)
            }
        }
    }
}

fn file_appender(path: &Path, rotation: LogRotation) -> RollingFileAppender {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path.file_name().unwrap_or(OsStr::new(DEFAULT_LOG_FILE));
    match rotation {
        LogRotation::Never => rolling::never(dir, name),
        LogRotation::Hourly => rolling::hourly(dir, name),
        LogRotation::Daily => rolling::daily(dir, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_event_presets() {
        assert_eq!(FmtSpan::from(SpanEventConfig::NONE), FmtSpan::NONE);
        assert_eq!(
            FmtSpan::from(SpanEventConfig::LIFECYCLE),
            FmtSpan::NEW | FmtSpan::CLOSE
        );
        assert_eq!(
            FmtSpan::from(SpanEventConfig::ACTIVE),
            FmtSpan::ENTER | FmtSpan::EXIT
        );
        assert_eq!(FmtSpan::from(SpanEventConfig::FULL), FmtSpan::FULL);
        assert_eq!(SpanEventConfig::default(), SpanEventConfig::NONE);
    }

    #[test]
    fn test_builder_from_config() {
        let mut config = LoggingConfig {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            file_location: true,
            ..Default::default()
        };
        config
            .filters
            .insert("tower".to_string(), LogLevel::Warn);
        config
            .filters
            .insert("frack_framework".to_string(), LogLevel::Trace);

        let builder = LoggingBuilder::from_config(&config).directive("hyper=off");
        assert_eq!(builder.config.level, LogLevel::Debug);
        assert_eq!(builder.config.format, LogFormat::Pretty);
        assert!(builder.config.file_location);
        assert_eq!(
            builder.directives,
            ["frack_framework=trace", "tower=warn", "hyper=off"]
        );
    }

    #[test]
    fn test_unusable_settings_are_collected() {
        let builder = LoggingBuilder::new()
            .output(LogOutput::File)
            .directive("frack_framework=loud")
            .directive("tower=warn");

        let mut ignored = Vec::new();
        let _filter = builder.filter(&mut ignored);
        let _writer = builder.writer(&mut ignored);

        assert_eq!(ignored.len(), 2);
        assert!(ignored[0].contains("\"frack_framework=loud\""));
        assert!(ignored[1].contains("no file_path"));
    }

    #[test]
    fn test_second_init_fails() {
        // Both calls race for the process-wide default; at most one can win.
        let first = LoggingBuilder::new().output(LogOutput::Stderr).try_init();
        let second = LoggingBuilder::new().output(LogOutput::Stderr).try_init();
        assert!(first.is_err() || second.is_err());
    }
}
