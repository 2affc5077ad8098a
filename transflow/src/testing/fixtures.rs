//! Record and transform fixtures for pipeline tests.

use crate::core::TransformOutput;
use crate::record::Record;
use crate::transforms::FnTransform;
use serde_json::Value;

/// Builds a record from a JSON object literal.
///
/// # Panics
///
/// Panics if `value` is not a JSON object.
#[track_caller]
pub fn record(value: Value) -> Record {
    match Record::from_value(value) {
        Ok(record) => record,
        Err(err) => panic!("Invalid test record: {err}"),
    }
}

/// A transform that adds `delta` to the integer under `key`, treating an
/// absent key as 0, and subtracts it on reverse.
pub fn shift(name: &str, key: &str, delta: i64) -> FnTransform {
    let forward_key = key.to_string();
    let reverse_key = key.to_string();
    FnTransform::new(name, move |mut record: Record| {
        let current = match record.get(&forward_key) {
            Some(_) => record.require_i64(&forward_key)?,
            None => 0,
        };
        record.insert(forward_key.clone(), current + delta);
        Ok(TransformOutput::Record(record))
    })
    .with_reverse(move |mut record: Record| {
        let current = record.require_i64(&reverse_key)?;
        record.insert(reverse_key.clone(), current - delta);
        Ok(TransformOutput::Record(record))
    })
}

/// A transform that multiplies the integer under `key` by `factor` and
/// divides it on reverse.
pub fn scale(name: &str, key: &str, factor: i64) -> FnTransform {
    let forward_key = key.to_string();
    let reverse_key = key.to_string();
    FnTransform::new(name, move |mut record: Record| {
        let current = record.require_i64(&forward_key)?;
        record.insert(forward_key.clone(), current * factor);
        Ok(TransformOutput::Record(record))
    })
    .with_reverse(move |mut record: Record| {
        let current = record.require_i64(&reverse_key)?;
        record.insert(reverse_key.clone(), current / factor);
        Ok(TransformOutput::Record(record))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::TransformExt;
    use serde_json::json;

    #[test]
    fn test_shift_from_empty() {
        let out = shift("a", "x", 1).invoke(Record::new(), false).unwrap();
        assert_eq!(out.into_record().unwrap(), record(json!({"x": 1})));
    }

    #[test]
    fn test_scale_round_trip() {
        let t = scale("b", "x", 2);
        let out = t.invoke(record(json!({"x": 3})), false).unwrap().into_record().unwrap();
        assert_eq!(out, record(json!({"x": 6})));
        let back = t.invoke(out, true).unwrap().into_record().unwrap();
        assert_eq!(back, record(json!({"x": 3})));
    }

    #[test]
    #[should_panic(expected = "Invalid test record")]
    fn test_record_rejects_non_object() {
        record(json!([1]));
    }
}
