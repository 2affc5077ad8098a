//! The transform contract and basic implementations.
//!
//! A [`Transform`] supplies a forward operation and, optionally, a reverse
//! one. Callers never pick between them directly: they go through
//! [`TransformExt::invoke`] with a `reverse` flag, which keeps reversal logic
//! identical for every stage of a pipeline.

mod wrappers;

pub use wrappers::{KeyMapper, RandomApply, RANDOM_APPLY_MARKER_PREFIX};

use crate::core::{Direction, TransformOutput, TransformResult};
use crate::record::Record;
use std::fmt::Debug;

/// Trait for record transforms.
///
/// Implementations hold only configuration. Anything that varies per call
/// lives in the record or in locals, so one instance can be shared across
/// threads and reused for any number of records.
pub trait Transform: Send + Sync + Debug {
    /// Returns the name of the transform.
    ///
    /// Defaults to the implementing type's name. Pipelines identify stages by
    /// the name they were registered under.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Applies the transform.
    ///
    /// May add or overwrite keys in `record`. Returns the record (or a
    /// replacement), a pair of aligned sequences, or
    /// [`TransformOutput::Dropped`] to reject the record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record violates the transform's preconditions.
    fn forward(&self, record: Record) -> TransformResult;

    /// Undoes the effect of [`forward`](Transform::forward) as far as possible.
    ///
    /// The default hands the record back untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the record violates the transform's preconditions.
    fn reverse(&self, record: Record) -> TransformResult {
        Ok(TransformOutput::Record(record))
    }
}

/// The entry point pipelines use to apply a transform.
///
/// Implemented for every [`Transform`], including trait objects, and not
/// meant to be implemented by hand.
pub trait TransformExt: Transform {
    /// Applies the reverse operation when `reverse` is true, the forward one otherwise.
    ///
    /// Errors from the delegated operation are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns whatever error the delegated operation returns.
    fn invoke(&self, record: Record, reverse: bool) -> TransformResult {
        if reverse {
            self.reverse(record)
        } else {
            self.forward(record)
        }
    }

    /// Applies the transform in the given direction.
    ///
    /// # Errors
    ///
    /// Returns whatever error the delegated operation returns.
    fn invoke_in(&self, record: Record, direction: Direction) -> TransformResult {
        self.invoke(record, direction.is_reverse())
    }
}

impl<T: Transform + ?Sized> TransformExt for T {}

type BoxedFn = Box<dyn Fn(Record) -> TransformResult + Send + Sync>;

/// A closure-backed transform.
pub struct FnTransform {
    name: String,
    forward: BoxedFn,
    reverse: Option<BoxedFn>,
}

impl FnTransform {
    /// Creates a transform from a forward closure. Reverse is the identity.
    pub fn new<F>(name: impl Into<String>, forward: F) -> Self
    where
        F: Fn(Record) -> TransformResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            forward: Box::new(forward),
            reverse: None,
        }
    }

    /// Sets the reverse closure.
    #[must_use]
    pub fn with_reverse<F>(mut self, reverse: F) -> Self
    where
        F: Fn(Record) -> TransformResult + Send + Sync + 'static,
    {
        self.reverse = Some(Box::new(reverse));
        self
    }

    /// Creates a transform that drops every record for which `keep` returns false.
    pub fn filter<P>(name: impl Into<String>, keep: P) -> Self
    where
        P: Fn(&Record) -> Result<bool, crate::errors::TransformError> + Send + Sync + 'static,
    {
        Self::new(name, move |record| {
            if keep(&record)? {
                Ok(TransformOutput::Record(record))
            } else {
                Ok(TransformOutput::Dropped)
            }
        })
    }

    /// Returns true if a reverse closure was supplied.
    #[must_use]
    pub fn is_reversible(&self) -> bool {
        self.reverse.is_some()
    }
}

impl Debug for FnTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTransform")
            .field("name", &self.name)
            .field("reversible", &self.is_reversible())
            .finish()
    }
}

impl Transform for FnTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, record: Record) -> TransformResult {
        (self.forward)(record)
    }

    fn reverse(&self, record: Record) -> TransformResult {
        match &self.reverse {
            Some(reverse) => reverse(record),
            None => Ok(TransformOutput::Record(record)),
        }
    }
}

/// A transform whose forward and reverse operations both return the record unchanged.
#[derive(Debug, Clone)]
pub struct IdentityTransform {
    name: String,
}

impl IdentityTransform {
    /// Creates a new identity transform.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Transform for IdentityTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, record: Record) -> TransformResult {
        Ok(TransformOutput::Record(record))
    }
}
