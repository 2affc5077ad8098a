//! Pipeline configuration.

use crate::errors::ConfigError;
use crate::observability::{init_tracing, LogFormat, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Environment variable overriding [`PipelineConfig::reverse_order`].
pub const ENV_REVERSE_ORDER: &str = "TRANSFLOW_REVERSE_ORDER";
/// Environment variable overriding the log level.
pub const ENV_LOG: &str = "TRANSFLOW_LOG";
/// Environment variable overriding the log format.
pub const ENV_LOG_FORMAT: &str = "TRANSFLOW_LOG_FORMAT";

/// Order in which a reverse run visits the stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReverseOrder {
    /// Last stage first, undoing later effects before earlier ones.
    #[default]
    Mirror,
    /// Same order as the forward run.
    Forward,
}

impl FromStr for ReverseOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mirror" => Ok(Self::Mirror),
            "forward" => Ok(Self::Forward),
            _ => Err(ConfigError::InvalidValue {
                setting: ENV_REVERSE_ORDER.to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Runtime policy for a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Stage order for reverse runs.
    pub reverse_order: ReverseOrder,
    /// Emit a `transform.completed` event for every stage.
    pub trace_stages: bool,
    /// Logging setup for hosts that let the pipeline initialize tracing.
    pub logging: LoggingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reverse_order: ReverseOrder::Mirror,
            trace_stages: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reverse order.
    #[must_use]
    pub fn with_reverse_order(mut self, order: ReverseOrder) -> Self {
        self.reverse_order = order;
        self
    }

    /// Enables or disables per-stage completion events.
    #[must_use]
    pub fn with_trace_stages(mut self, trace: bool) -> Self {
        self.trace_stages = trace;
        self
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Applies `TRANSFLOW_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an override has an unsupported value.
    pub fn merge_with_env(&mut self) -> Result<(), ConfigError> {
        self.merge_with(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`, keyed by environment variable name.
    ///
    /// Either every override is applied or, on error, none is.
    ///
    /// # Errors
    ///
    /// Returns an error if an override has an unsupported value.
    pub fn merge_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let reverse_order = lookup(ENV_REVERSE_ORDER)
            .map(|order| order.parse::<ReverseOrder>())
            .transpose()?;
        let format = lookup(ENV_LOG_FORMAT)
            .map(|format| format.parse::<LogFormat>())
            .transpose()?;
        let level = lookup(ENV_LOG);

        if let Some(order) = reverse_order {
            self.reverse_order = order;
        }
        if let Some(format) = format {
            self.logging.format = format;
        }
        if let Some(level) = level {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Installs the global `tracing` subscriber described by [`logging`](Self::logging).
    ///
    /// # Errors
    ///
    /// Returns an error if the logging configuration is invalid or a global
    /// subscriber is already installed.
    pub fn init_tracing(&self) -> Result<(), ConfigError> {
        init_tracing(&self.logging)
    }
}
