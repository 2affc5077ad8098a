//! Error types for transflow.
//!
//! Transforms report precondition failures through [`TransformError`].
//! A dropped record is not an error: it is the
//! [`TransformOutput::Dropped`](crate::core::TransformOutput::Dropped) outcome.

use crate::core::{Direction, OutputKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The umbrella error type for transflow operations.
#[derive(Debug, Error)]
pub enum TransflowError {
    /// A pipeline could not be built.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// A transform failed while processing a record.
    #[error("{0}")]
    Transform(#[from] TransformError),

    /// Configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by a transform, or by a pipeline on behalf of one of its stages.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A key the transform requires is absent from the record.
    #[error("Missing required key '{key}'")]
    MissingKey {
        /// The missing key.
        key: String,
    },

    /// A key holds a value of the wrong JSON type.
    #[error("Key '{key}' has invalid type: expected {expected}, found {found}")]
    InvalidType {
        /// The offending key.
        key: String,
        /// The JSON type the transform expected.
        expected: &'static str,
        /// The JSON type actually present.
        found: &'static str,
    },

    /// Any other violated precondition.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A stage produced a non-record output that a following stage would have to consume.
    #[error("Transform '{stage}' produced a {kind} output, but later transforms need a record")]
    NonRecordOutput {
        /// The stage that produced the output.
        stage: String,
        /// The kind of output produced.
        kind: OutputKind,
    },

    /// A pipeline stage failed. Wraps the stage's own error.
    #[error("Transform '{stage}' (#{index}) failed during {direction}: {source}")]
    Stage {
        /// The stage name.
        stage: String,
        /// Position of the stage in the pipeline.
        index: usize,
        /// The direction being applied.
        direction: Direction,
        /// The error raised by the stage.
        #[source]
        source: Box<TransformError>,
    },

    /// An error from a transform that uses `anyhow` internally.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TransformError {
    /// Creates a missing key error.
    #[must_use]
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey { key: key.into() }
    }

    /// Creates an invalid type error.
    #[must_use]
    pub fn invalid_type(key: impl Into<String>, expected: &'static str, found: &'static str) -> Self {
        Self::InvalidType {
            key: key.into(),
            expected,
            found,
        }
    }

    /// Creates a generic precondition error.
    #[must_use]
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Wraps this error with the identity of the stage that raised it.
    #[must_use]
    pub fn in_stage(self, stage: impl Into<String>, index: usize, direction: Direction) -> Self {
        Self::Stage {
            stage: stage.into(),
            index,
            direction,
            source: Box::new(self),
        }
    }

    /// Returns the stage names from the outermost pipeline to the failing stage.
    #[must_use]
    pub fn stage_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        while let Self::Stage { stage, source, .. } = current {
            path.push(stage.as_str());
            current = source.as_ref();
        }
        path
    }

    /// Returns the innermost error, unwrapping any stage context.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        let mut current = self;
        while let Self::Stage { source, .. } = current {
            current = source.as_ref();
        }
        current
    }

    /// Returns true if the root cause is a violated precondition.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::MissingKey { .. } | Self::InvalidType { .. } | Self::Precondition(_)
        )
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();

        let kind = match self.root_cause() {
            Self::MissingKey { .. } => "MissingKey",
            Self::InvalidType { .. } => "InvalidType",
            Self::Precondition(_) => "Precondition",
            Self::NonRecordOutput { .. } => "NonRecordOutput",
            Self::Stage { .. } => "Stage",
            Self::Other(_) => "Other",
        };
        map.insert("type".to_string(), serde_json::json!(kind));

        let path = self.stage_path();
        if !path.is_empty() {
            map.insert("stage_path".to_string(), serde_json::json!(path));
        }

        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Metadata about a pipeline contract violation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "TRANSFLOW-DUPLICATE").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Error raised when a pipeline or wrapper cannot be constructed.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
    /// Optional contract error info.
    pub error_info: Option<ContractErrorInfo>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
            error_info: None,
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }

    /// Sets the contract error info.
    #[must_use]
    pub fn with_error_info(mut self, info: ContractErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    /// Returns the contract error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info.as_ref().map(|info| info.code.as_str())
    }
}

/// Errors raised while loading pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is not valid JSON for the expected shape.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A setting has an unsupported value.
    #[error("Invalid value '{value}' for {setting}")]
    InvalidValue {
        /// The setting name.
        setting: String,
        /// The rejected value.
        value: String,
    },

    /// The tracing subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}
