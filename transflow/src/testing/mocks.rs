//! Mock transforms for testing.

use parking_lot::Mutex;

use crate::core::{Direction, TransformOutput, TransformResult};
use crate::errors::TransformError;
use crate::record::Record;
use crate::transforms::Transform;

/// A mock transform that records calls and returns configurable outputs.
///
/// Until an output is set for a direction, the record is passed through.
#[derive(Debug)]
pub struct MockTransform {
    name: String,
    forward_output: Mutex<Option<TransformOutput>>,
    reverse_output: Mutex<Option<TransformOutput>>,
    calls: Mutex<Vec<(Direction, Record)>>,
}

impl MockTransform {
    /// Creates a new pass-through mock transform.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            forward_output: Mutex::new(None),
            reverse_output: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sets the output returned by forward calls.
    pub fn set_forward_output(&self, output: TransformOutput) {
        *self.forward_output.lock() = Some(output);
    }

    /// Sets the output returned by reverse calls.
    pub fn set_reverse_output(&self, output: TransformOutput) {
        *self.reverse_output.lock() = Some(output);
    }

    /// Returns the number of times the transform was called, in either direction.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the number of calls in one direction.
    #[must_use]
    pub fn calls_in(&self, direction: Direction) -> usize {
        self.calls.lock().iter().filter(|(d, _)| *d == direction).count()
    }

    /// Returns the records received by each call.
    #[must_use]
    pub fn recorded_inputs(&self) -> Vec<(Direction, Record)> {
        self.calls.lock().clone()
    }

    /// Resets call tracking.
    pub fn reset(&self) {
        self.calls.lock().clear();
    }

    fn respond(&self, record: Record, direction: Direction) -> TransformResult {
        self.calls.lock().push((direction, record.clone()));
        let configured = match direction {
            Direction::Forward => self.forward_output.lock().clone(),
            Direction::Reverse => self.reverse_output.lock().clone(),
        };
        Ok(configured.unwrap_or(TransformOutput::Record(record)))
    }
}

impl Transform for MockTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, record: Record) -> TransformResult {
        self.respond(record, Direction::Forward)
    }

    fn reverse(&self, record: Record) -> TransformResult {
        self.respond(record, Direction::Reverse)
    }
}

/// A pass-through transform that counts its invocations.
#[derive(Debug)]
pub struct CountingTransform {
    name: String,
    forward_calls: Mutex<usize>,
    reverse_calls: Mutex<usize>,
}

impl CountingTransform {
    /// Creates a new counting transform.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            forward_calls: Mutex::new(0),
            reverse_calls: Mutex::new(0),
        }
    }

    /// Returns the number of forward calls.
    #[must_use]
    pub fn forward_calls(&self) -> usize {
        *self.forward_calls.lock()
    }

    /// Returns the number of reverse calls.
    #[must_use]
    pub fn reverse_calls(&self) -> usize {
        *self.reverse_calls.lock()
    }
}

impl Transform for CountingTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, record: Record) -> TransformResult {
        *self.forward_calls.lock() += 1;
        Ok(TransformOutput::Record(record))
    }

    fn reverse(&self, record: Record) -> TransformResult {
        *self.reverse_calls.lock() += 1;
        Ok(TransformOutput::Record(record))
    }
}

/// A transform that always fails with a precondition error.
#[derive(Debug)]
pub struct FailingTransform {
    name: String,
    message: String,
    reverse_only: bool,
}

impl FailingTransform {
    /// Creates a transform that fails in both directions.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            reverse_only: false,
        }
    }

    /// Creates a transform whose forward call succeeds and reverse call fails.
    #[must_use]
    pub fn reverse_only(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            reverse_only: true,
            ..Self::new(name, message)
        }
    }
}

impl Transform for FailingTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, record: Record) -> TransformResult {
        if self.reverse_only {
            Ok(TransformOutput::Record(record))
        } else {
            Err(TransformError::precondition(self.message.clone()))
        }
    }

    fn reverse(&self, _record: Record) -> TransformResult {
        Err(TransformError::precondition(self.message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::TransformExt;
    use serde_json::json;

    #[test]
    fn test_mock_transform() {
        let transform = MockTransform::new("mock");
        let record: Record = [("x", 1)].into_iter().collect();

        let output = transform.invoke(record.clone(), false).unwrap();
        assert_eq!(output, TransformOutput::Record(record.clone()));
        assert_eq!(transform.call_count(), 1);

        transform.set_forward_output(TransformOutput::Dropped);
        assert!(transform.invoke(record.clone(), false).unwrap().is_dropped());

        transform.invoke(record, true).unwrap();
        assert_eq!(transform.calls_in(Direction::Forward), 2);
        assert_eq!(transform.calls_in(Direction::Reverse), 1);

        transform.reset();
        assert_eq!(transform.call_count(), 0);
    }

    #[test]
    fn test_mock_transform_records_inputs() {
        let transform = MockTransform::new("mock");
        transform.set_reverse_output(TransformOutput::pair(vec![json!("a")], vec![json!(1.0)]));

        let record: Record = [("y", "z")].into_iter().collect();
        let output = transform.invoke(record.clone(), true).unwrap();

        assert!(output.is_pair());
        assert_eq!(transform.recorded_inputs(), vec![(Direction::Reverse, record)]);
    }

    #[test]
    fn test_counting_transform() {
        let transform = CountingTransform::new("count");
        transform.invoke(Record::new(), false).unwrap();
        transform.invoke(Record::new(), false).unwrap();
        transform.invoke(Record::new(), true).unwrap();

        assert_eq!(transform.forward_calls(), 2);
        assert_eq!(transform.reverse_calls(), 1);
    }

    #[test]
    fn test_failing_transform() {
        let transform = FailingTransform::new("fail", "boom");
        let err = transform.invoke(Record::new(), false).unwrap_err();
        assert!(err.is_precondition());
        assert!(err.to_string().contains("boom"));

        let transform = FailingTransform::reverse_only("fail", "no way back");
        assert!(transform.invoke(Record::new(), false).is_ok());
        assert!(transform.invoke(Record::new(), true).is_err());
    }
}
