//! Test assertions for transform outputs.

use crate::core::TransformOutput;
use crate::record::Record;
use serde_json::Value;

/// Asserts that the output is a record and returns it.
#[track_caller]
pub fn assert_record(output: &TransformOutput) -> &Record {
    match output {
        TransformOutput::Record(record) => record,
        other => panic!("Expected a record, got {} output", other.kind()),
    }
}

/// Asserts that the output is `Dropped`.
#[track_caller]
pub fn assert_dropped(output: &TransformOutput) {
    assert!(
        output.is_dropped(),
        "Expected a dropped record, got {} output",
        output.kind()
    );
}

/// Asserts that the output is a pair equal to the expected sequences.
#[track_caller]
pub fn assert_pair(output: &TransformOutput, first: &[Value], second: &[Value]) {
    match output {
        TransformOutput::Pair(a, b) => {
            assert_eq!(a.as_slice(), first, "First sequence of pair differs");
            assert_eq!(b.as_slice(), second, "Second sequence of pair differs");
        }
        other => panic!("Expected a pair, got {} output", other.kind()),
    }
}

/// Asserts that the output is a record holding `expected` under `key`.
#[track_caller]
pub fn assert_record_value(output: &TransformOutput, key: &str, expected: &Value) {
    let record = assert_record(output);
    let actual = record.get(key);
    assert_eq!(
        actual,
        Some(expected),
        "Expected value {expected:?} for key '{key}', got {actual:?}. Keys: {:?}",
        record.keys()
    );
}
