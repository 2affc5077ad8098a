//! Transform output type with factory methods.

use super::OutputKind;
use crate::errors::TransformError;
use crate::record::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// The result of applying a transform in either direction.
pub type TransformResult = Result<TransformOutput, TransformError>;

/// What a transform hands back after processing a record.
///
/// Pipeline drivers match on the variant: a `Record` continues to the next
/// stage, a `Pair` can only end a run, and `Dropped` stops the run for this
/// record without being an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TransformOutput {
    /// The same or a replacement record.
    Record(Record),
    /// Two aligned sequences, e.g. candidate items and their scores.
    Pair(Vec<Value>, Vec<Value>),
    /// The record should not continue through the pipeline.
    Dropped,
}

impl From<Record> for TransformOutput {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

impl TransformOutput {
    /// Creates a record output.
    #[must_use]
    pub fn record(record: Record) -> Self {
        Self::Record(record)
    }

    /// Creates a pair output from two sequences.
    #[must_use]
    pub fn pair<A, B>(first: A, second: B) -> Self
    where
        A: IntoIterator,
        A::Item: Into<Value>,
        B: IntoIterator,
        B::Item: Into<Value>,
    {
        Self::Pair(
            first.into_iter().map(Into::into).collect(),
            second.into_iter().map(Into::into).collect(),
        )
    }

    /// Creates a dropped output.
    #[must_use]
    pub fn dropped() -> Self {
        Self::Dropped
    }

    /// Returns the kind of this output.
    #[must_use]
    pub fn kind(&self) -> OutputKind {
        match self {
            Self::Record(_) => OutputKind::Record,
            Self::Pair(..) => OutputKind::Pair,
            Self::Dropped => OutputKind::Dropped,
        }
    }

    /// Returns true if the output is a record.
    #[must_use]
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }

    /// Returns true if the output is a pair.
    #[must_use]
    pub fn is_pair(&self) -> bool {
        matches!(self, Self::Pair(..))
    }

    /// Returns true if the record was dropped.
    #[must_use]
    pub fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped)
    }

    /// Returns the record, if this output is one.
    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Consumes the output, returning the record if there is one.
    #[must_use]
    pub fn into_record(self) -> Option<Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Consumes the output, returning the pair if there is one.
    #[must_use]
    pub fn into_pair(self) -> Option<(Vec<Value>, Vec<Value>)> {
        match self {
            Self::Pair(first, second) => Some((first, second)),
            _ => None,
        }
    }

    /// Converts the output to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, Value> {
        let mut map = HashMap::new();
        map.insert("kind".to_string(), serde_json::json!(self.kind().to_string()));

        match self {
            Self::Record(record) => {
                map.insert("record".to_string(), record.to_value());
            }
            Self::Pair(first, second) => {
                map.insert("pair".to_string(), serde_json::json!([first, second]));
            }
            Self::Dropped => {}
        }

        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_output() {
        let record: Record = [("x", 1)].into_iter().collect();
        let output = TransformOutput::from(record.clone());

        assert!(output.is_record());
        assert_eq!(output.kind(), OutputKind::Record);
        assert_eq!(output.as_record(), Some(&record));
    }

    #[test]
    fn test_pair_output() {
        let output = TransformOutput::pair(["a", "b"], [0.9, 0.1]);
        assert!(output.is_pair());

        let (items, scores) = output.into_pair().unwrap();
        assert_eq!(items, vec![serde_json::json!("a"), serde_json::json!("b")]);
        assert_eq!(scores, vec![serde_json::json!(0.9), serde_json::json!(0.1)]);
    }

    #[test]
    fn test_dropped_output() {
        let output = TransformOutput::dropped();
        assert!(output.is_dropped());
        assert!(output.as_record().is_none());
        assert!(output.into_record().is_none());
    }
}
