//! Structured logging setup.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Compact single-line output.
    #[default]
    Compact,
    /// Full output with all span context.
    Full,
    /// JSON structured output.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "full" => Ok(Self::Full),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidValue {
                setting: "log format".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter, in `EnvFilter` syntax.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Include thread IDs.
    pub thread_ids: bool,
    /// Include file and line numbers.
    pub source_location: bool,
    /// Per-module level overrides.
    pub module_filter: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            thread_ids: false,
            source_location: false,
            module_filter: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Builds the `EnvFilter` for this configuration.
    ///
    /// `RUST_LOG` takes precedence over the configured level.
    ///
    /// # Errors
    ///
    /// Returns an error if a module filter is not a valid directive.
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        let mut filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        for (module, level) in &self.module_filter {
            let directive = format!("{module}={level}");
            let parsed = directive.parse::<Directive>().map_err(|_| ConfigError::InvalidValue {
                setting: "module filter".to_string(),
                value: directive.clone(),
            })?;
            filter = filter.add_directive(parsed);
        }

        Ok(filter)
    }
}

/// Installs a global `tracing` subscriber for the given configuration.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a global subscriber is
/// already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ConfigError> {
    let env_filter = config.env_filter()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(config.thread_ids)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    let installed = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Full => builder.try_init(),
        LogFormat::Json => builder.with_ansi(false).json().try_init(),
    };

    installed.map_err(|e| ConfigError::Logging(e.to_string()))?;

    tracing::debug!(config = ?config, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_logging_config_defaults_from_partial_json() {
        let config: LoggingConfig = serde_json::from_str(r#"{"level": "debug"}"#).unwrap();
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.module_filter.is_empty());
    }

    #[test]
    fn test_env_filter_rejects_bad_directive() {
        let mut config = LoggingConfig::default();
        config.module_filter.insert("transflow".to_string(), "not a level!".to_string());
        assert!(config.env_filter().is_err());
    }

    #[test]
    fn test_init_tracing_installs_once() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Json,
            ..LoggingConfig::default()
        };

        init_tracing(&config).unwrap();
        let err = init_tracing(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Logging(_)));
    }
}
