//! Core value types for transflow.
//!
//! This module contains:
//! - The direction a transform is applied in
//! - The three-way transform output (record, pair, dropped)

mod direction;
mod output;

pub use direction::{Direction, OutputKind};
pub use output::{TransformOutput, TransformResult};
