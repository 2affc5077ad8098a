//! Pipeline building and execution.
//!
//! This module provides:
//! - Stage specifications and a validating builder
//! - Sequential forward and reverse execution
//! - Per-run traces and runtime configuration

mod builder;
mod compose;
mod config;
mod run;
mod spec;

#[cfg(test)]
mod integration_tests;

pub use builder::PipelineBuilder;
pub use compose::Pipeline;
pub use config::{PipelineConfig, ReverseOrder, ENV_LOG, ENV_LOG_FORMAT, ENV_REVERSE_ORDER};
pub use run::{PipelineRun, StageRecord};
pub use spec::TransformSpec;
