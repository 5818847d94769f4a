//! Checks that cannot be expressed in the schema types.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{FrackConfig, LogOutput, LoggingConfig, MiddlewareKind, PipelineConfig};

/// Runs every check, stopping at the first problem.
pub fn validate_config(config: &FrackConfig) -> ConfigResult<()> {
    check_logging(&config.logging)?;
    check_pipeline(&config.pipeline)
}

fn check_logging(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing("logging.file_path"));
    }
    match logging.filters.keys().find(|target| target.trim().is_empty()) {
        Some(target) => Err(ConfigError::invalid(format!(
            "log filter target {target:?} is blank"
        ))),
        None => Ok(()),
    }
}

fn check_pipeline(pipeline: &PipelineConfig) -> ConfigResult<()> {
    let mut seen = HashSet::with_capacity(pipeline.middleware.len());
    if let Some(dup) = pipeline.middleware.iter().find(|kind| !seen.insert(**kind)) {
        return Err(ConfigError::invalid(format!(
            "middleware `{dup}` appears more than once"
        )));
    }

    if seen.contains(&MiddlewareKind::Timeout) {
        match pipeline.timeout_ms {
            None => return Err(ConfigError::missing("pipeline.timeout_ms")),
            Some(0) => return Err(ConfigError::invalid("pipeline.timeout_ms is 0")),
            Some(_) => {}
        }
    }

    // An empty route label would print as `route=`; leave it out instead.
    if pipeline.name.as_deref().is_some_and(str::is_empty) {
        return Err(ConfigError::invalid("pipeline.name is empty"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&FrackConfig::default()).is_ok());
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = FrackConfig::default();
        config.logging.output = LogOutput::File;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { key: "logging.file_path" }));
        assert_eq!(err.to_string(), "`logging.file_path` must be set");

        config.logging.file_path = Some(PathBuf::from("frack.log"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_blank_filter_target_rejected() {
        let mut config = FrackConfig::default();
        config
            .logging
            .filters
            .insert("  ".to_string(), Default::default());
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_timeout_needs_duration() {
        let mut config = FrackConfig::default();
        config.pipeline.middleware.push(MiddlewareKind::Timeout);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));

        config.pipeline.timeout_ms = Some(0);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Invalid { .. })
        ));

        config.pipeline.timeout_ms = Some(250);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_duplicate_middleware_rejected() {
        let mut config = FrackConfig::default();
        config.pipeline.middleware = vec![MiddlewareKind::Head, MiddlewareKind::Head];
        let err = validate_config(&config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: middleware `head` appears more than once"
        );
    }
}
