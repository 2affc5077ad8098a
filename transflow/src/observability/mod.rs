//! Logging and tracing integration.
//!
//! Pipelines open a `pipeline` span per run and a `transform` span per stage;
//! [`init_tracing`] installs a subscriber that renders them.

mod logging;

pub use logging::{init_tracing, LogFormat, LoggingConfig};

use crate::core::Direction;
use tracing::Span;
use uuid::Uuid;

/// Creates the span that covers one pipeline run.
#[must_use]
pub fn pipeline_span(pipeline: &str, run_id: Uuid, direction: Direction) -> Span {
    tracing::debug_span!(
        "pipeline",
        pipeline = %pipeline,
        run_id = %run_id,
        direction = %direction,
    )
}

/// Creates the span that covers one stage invocation.
#[must_use]
pub fn transform_span(stage: &str, index: usize) -> Span {
    tracing::debug_span!("transform", stage = %stage, index = index)
}
