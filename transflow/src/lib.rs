//! # Transflow
//!
//! Reversible record transforms and the pipelines that compose them.
//!
//! Transflow provides:
//!
//! - **A transform contract**: a required forward operation, an optional
//!   reverse operation, and one dispatch entry point for both
//! - **Three-way outputs**: a record, a pair of aligned sequences, or a drop
//! - **Sequential pipelines**: drop short-circuiting, stage-attributed errors,
//!   configurable reverse order and nesting
//! - **Event-driven observability**: event sinks and `tracing` spans per run
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use transflow::prelude::*;
//!
//! let pipeline = PipelineBuilder::new("preprocess")
//!     .transform("resize", Arc::new(Resize::new(224)))?
//!     .transform("normalize", Arc::new(Normalize::imagenet()))?
//!     .build()?;
//!
//! let output = pipeline.run(record)?;
//! let restored = pipeline.run_reverse(output.into_record().unwrap_or_default())?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod record;
pub mod testing;
pub mod transforms;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{Direction, OutputKind, TransformOutput, TransformResult};
    pub use crate::errors::{
        ConfigError, ContractErrorInfo, PipelineValidationError, TransflowError,
        TransformError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::observability::{init_tracing, LogFormat, LoggingConfig};
    pub use crate::pipeline::{
        Pipeline, PipelineBuilder, PipelineConfig, PipelineRun, ReverseOrder, StageRecord,
        TransformSpec,
    };
    pub use crate::record::Record;
    pub use crate::transforms::{
        FnTransform, IdentityTransform, KeyMapper, RandomApply, Transform, TransformExt,
    };
}
