//! Testing utilities for transflow pipelines.
//!
//! This module provides:
//! - Mock, counting and failing transforms
//! - Assertions on transform outputs
//! - Record and transform fixtures

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_dropped, assert_pair, assert_record, assert_record_value};
pub use fixtures::{record, scale, shift};
pub use mocks::{CountingTransform, FailingTransform, MockTransform};
