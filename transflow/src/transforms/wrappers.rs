//! Transforms that wrap another transform.

use super::{Transform, TransformExt};
use crate::core::{Direction, TransformOutput, TransformResult};
use crate::errors::{ContractErrorInfo, PipelineValidationError, TransformError};
use crate::record::Record;
use rand::Rng;
use std::sync::Arc;

/// Runs an inner transform against renamed keys.
///
/// Before the inner call every mapped outer key is renamed to its inner key.
/// Afterwards the output mapping renames inner keys back. Unless explicit
/// output mappings are given, the output mapping is the inverse of the input
/// mapping. Keys that are not mapped pass through untouched.
///
/// `reverse` runs the same renames backwards: the output mapping is undone
/// before the inner reverse call and the input mapping after it. A rename
/// onto a key that is still present fails with a precondition error.
#[derive(Debug, Clone)]
pub struct KeyMapper {
    name: String,
    inner: Arc<dyn Transform>,
    /// (outer, inner) pairs.
    input_map: Vec<(String, String)>,
    /// (inner, outer) pairs.
    output_map: Vec<(String, String)>,
    allow_missing: bool,
}

impl KeyMapper {
    /// Creates a key mapper around `inner` with no mappings.
    #[must_use]
    pub fn new(name: impl Into<String>, inner: Arc<dyn Transform>) -> Self {
        Self {
            name: name.into(),
            inner,
            input_map: Vec::new(),
            output_map: Vec::new(),
            allow_missing: false,
        }
    }

    /// Exposes the record's `outer` key to the inner transform as `inner`.
    #[must_use]
    pub fn map_input(mut self, outer: impl Into<String>, inner: impl Into<String>) -> Self {
        self.input_map.push((outer.into(), inner.into()));
        self
    }

    /// Renames the inner transform's `inner` key to `outer` after the call.
    #[must_use]
    pub fn map_output(mut self, inner: impl Into<String>, outer: impl Into<String>) -> Self {
        self.output_map.push((inner.into(), outer.into()));
        self
    }

    /// Skips mapped input keys that are absent instead of failing.
    #[must_use]
    pub fn allow_missing(mut self, allow: bool) -> Self {
        self.allow_missing = allow;
        self
    }

    /// (outer, inner) renames applied before a forward call.
    fn input_renames(&self) -> Vec<(&str, &str)> {
        self.input_map
            .iter()
            .map(|(outer, inner)| (outer.as_str(), inner.as_str()))
            .collect()
    }

    /// (inner, outer) renames applied after a forward call.
    fn output_renames(&self) -> Vec<(&str, &str)> {
        if self.output_map.is_empty() {
            self.input_map
                .iter()
                .map(|(outer, inner)| (inner.as_str(), outer.as_str()))
                .collect()
        } else {
            self.output_map
                .iter()
                .map(|(inner, outer)| (inner.as_str(), outer.as_str()))
                .collect()
        }
    }

    /// Moves every `from` key to its `to` key.
    ///
    /// All sources are taken out before any destination is written, so
    /// swaps and chains keep every value. A destination that is still
    /// occupied after that is rejected rather than overwritten.
    fn rename(&self, mut record: Record, renames: &[(&str, &str)], required: bool) -> Result<Record, TransformError> {
        let mut moved = Vec::with_capacity(renames.len());
        for &(from, to) in renames {
            match record.remove(from) {
                Some(value) => moved.push((to, value)),
                None if required && !self.allow_missing => {
                    return Err(TransformError::missing_key(from));
                }
                None => {}
            }
        }

        for (to, value) in moved {
            if record.contains_key(to) {
                return Err(TransformError::precondition(format!(
                    "KeyMapper '{}' would overwrite existing key '{to}'",
                    self.name
                )));
            }
            record.insert(to, value);
        }
        Ok(record)
    }

    fn apply(&self, record: Record, direction: Direction) -> TransformResult {
        let (before, after) = match direction {
            Direction::Forward => (self.input_renames(), self.output_renames()),
            Direction::Reverse => (invert(&self.output_renames()), invert(&self.input_renames())),
        };

        let record = self.rename(record, &before, true)?;
        match self.inner.invoke_in(record, direction)? {
            TransformOutput::Record(record) => Ok(TransformOutput::Record(self.rename(record, &after, false)?)),
            other => Ok(other),
        }
    }
}

fn invert<'a>(renames: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
    renames.iter().map(|&(from, to)| (to, from)).collect()
}

impl Transform for KeyMapper {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, record: Record) -> TransformResult {
        self.apply(record, Direction::Forward)
    }

    fn reverse(&self, record: Record) -> TransformResult {
        self.apply(record, Direction::Reverse)
    }
}

/// Prefix of the record key where [`RandomApply`] stores its decision.
pub const RANDOM_APPLY_MARKER_PREFIX: &str = "__random_apply__.";

/// Applies an inner transform with a fixed probability.
///
/// The decision is written into the record, so `reverse` only undoes the
/// inner transform for records the forward call actually changed.
#[derive(Debug, Clone)]
pub struct RandomApply {
    name: String,
    inner: Arc<dyn Transform>,
    prob: f64,
    marker: String,
}

impl RandomApply {
    /// Creates a new random apply wrapper.
    ///
    /// # Errors
    ///
    /// Returns an error if `prob` is not within `[0, 1]`.
    pub fn new(
        name: impl Into<String>,
        inner: Arc<dyn Transform>,
        prob: f64,
    ) -> Result<Self, PipelineValidationError> {
        let name = name.into();
        if !(0.0..=1.0).contains(&prob) {
            return Err(PipelineValidationError::new(format!(
                "RandomApply '{name}' has probability {prob}, expected a value in [0, 1]"
            ))
            .with_stages(vec![name.clone()])
            .with_error_info(
                ContractErrorInfo::new("TRANSFLOW-INVALID-PROB", "Probability out of range")
                    .with_fix_hint("Use a probability between 0.0 and 1.0 inclusive."),
            ));
        }

        let marker = format!("{RANDOM_APPLY_MARKER_PREFIX}{name}");
        Ok(Self {
            name,
            inner,
            prob,
            marker,
        })
    }

    /// Returns the probability of applying the inner transform.
    #[must_use]
    pub fn prob(&self) -> f64 {
        self.prob
    }

    /// Returns the record key holding this wrapper's decision.
    #[must_use]
    pub fn marker_key(&self) -> &str {
        &self.marker
    }
}

impl Transform for RandomApply {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, mut record: Record) -> TransformResult {
        if !rand::thread_rng().gen_bool(self.prob) {
            record.insert(self.marker.clone(), false);
            return Ok(TransformOutput::Record(record));
        }

        match self.inner.invoke(record, false)? {
            TransformOutput::Record(mut record) => {
                record.insert(self.marker.clone(), true);
                Ok(TransformOutput::Record(record))
            }
            other => Ok(other),
        }
    }

    fn reverse(&self, mut record: Record) -> TransformResult {
        let applied = record
            .remove(&self.marker)
            .and_then(|value| value.as_bool())
            .unwrap_or(false);

        if applied {
            self.inner.invoke(record, true)
        } else {
            Ok(TransformOutput::Record(record))
        }
    }
}
