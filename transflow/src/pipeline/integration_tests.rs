//! Integration tests for pipeline execution.

#[cfg(test)]
mod tests {
    use crate::core::{Direction, OutputKind, TransformOutput};
    use crate::errors::TransformError;
    use crate::events::CollectingEventSink;
    use crate::pipeline::{Pipeline, PipelineBuilder, PipelineConfig, ReverseOrder};
    use crate::record::Record;
    use crate::testing::{
        assert_dropped, assert_pair, assert_record, assert_record_value, record, scale, shift,
        CountingTransform, FailingTransform, MockTransform,
    };
    use crate::transforms::{FnTransform, IdentityTransform, RandomApply, Transform, TransformExt};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn round_trip_pipeline() -> Pipeline {
        PipelineBuilder::new("round_trip")
            .transform("A", Arc::new(shift("A", "x", 1)))
            .unwrap()
            .transform("B", Arc::new(scale("B", "x", 2)))
            .unwrap()
            .build()
            .unwrap()
    }

    fn non_negative() -> Arc<dyn Transform> {
        Arc::new(FnTransform::filter("Filter", |r: &Record| Ok(r.require_i64("x")? >= 0)))
    }

    fn set_x(value: i64) -> Arc<dyn Transform> {
        Arc::new(FnTransform::new("A", move |mut r: Record| {
            r.insert("x", value);
            Ok(r.into())
        }))
    }

    fn top_k() -> Arc<dyn Transform> {
        Arc::new(FnTransform::new("C", |_r: Record| {
            Ok(TransformOutput::pair(vec![json!("a"), json!("b")], vec![json!(0.9), json!(0.1)]))
        }))
    }

    #[test]
    fn test_dispatch_equivalence() {
        let a = shift("A", "x", 1);
        let input = record(json!({"x": 4}));

        assert_eq!(a.invoke(input.clone(), false).unwrap(), a.forward(input.clone()).unwrap());
        assert_eq!(a.invoke(input.clone(), true).unwrap(), a.reverse(input).unwrap());
    }

    #[test]
    fn test_default_reverse_identity_and_idempotence() {
        let t = IdentityTransform::new("noop");
        let input = record(json!({"x": 1, "tag": "keep"}));

        let once = t.invoke(input.clone(), true).unwrap().into_record().unwrap();
        assert_eq!(once, input);
        let twice = t.invoke(once.clone(), true).unwrap().into_record().unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn test_round_trip_numeric_trace() {
        let pipeline = round_trip_pipeline();

        let after_a = shift("A", "x", 1).invoke(Record::new(), false).unwrap();
        assert_record_value(&after_a, "x", &json!(1));

        let forward = pipeline.run(Record::new()).unwrap();
        assert_eq!(assert_record(&forward), &record(json!({"x": 2})));

        let after_b = scale("B", "x", 2).invoke(record(json!({"x": 2})), true).unwrap();
        assert_record_value(&after_b, "x", &json!(1));

        let reverse = pipeline.run_reverse(record(json!({"x": 2}))).unwrap();
        assert_eq!(assert_record(&reverse), &record(json!({"x": 0})));
    }

    #[test]
    fn test_reverse_visits_stages_in_mirror_order() {
        let pipeline = round_trip_pipeline();
        let run = pipeline.run_traced(record(json!({"x": 2})), Direction::Reverse).unwrap();

        assert_eq!(run.executed_stages(), vec!["B", "A"]);
        assert_eq!(run.direction, Direction::Reverse);
    }

    #[test]
    fn test_forward_reverse_order_policy() {
        let config = PipelineConfig::new().with_reverse_order(ReverseOrder::Forward);
        let pipeline = PipelineBuilder::new("forward_order")
            .transform("A", Arc::new(shift("A", "x", 1)))
            .unwrap()
            .transform("B", Arc::new(scale("B", "x", 2)))
            .unwrap()
            .with_config(config)
            .build()
            .unwrap();

        let run = pipeline.run_traced(record(json!({"x": 2})), Direction::Reverse).unwrap();
        assert_eq!(run.executed_stages(), vec!["A", "B"]);
        // (2 - 1) / 2 with integer division
        assert_record_value(&run.output, "x", &json!(0));
    }

    #[test]
    fn test_drop_short_circuits() {
        let b = Arc::new(CountingTransform::new("B"));
        let pipeline = PipelineBuilder::new("filtered")
            .transform("A", set_x(-1))
            .unwrap()
            .transform("Filter", non_negative())
            .unwrap()
            .transform("B", b.clone())
            .unwrap()
            .build()
            .unwrap();

        let run = pipeline.run_traced(record(json!({"x": 5})), Direction::Forward).unwrap();

        assert_dropped(&run.output);
        assert_eq!(b.forward_calls(), 0);
        assert_eq!(run.executed_stages(), vec!["A", "Filter"]);
        assert_eq!(run.dropped_at().map(|s| s.name.as_str()), Some("Filter"));
    }

    #[test]
    fn test_kept_record_reaches_later_stages() {
        let b = Arc::new(CountingTransform::new("B"));
        let pipeline = PipelineBuilder::new("filtered")
            .transform("A", set_x(3))
            .unwrap()
            .transform("Filter", non_negative())
            .unwrap()
            .transform("B", b.clone())
            .unwrap()
            .build()
            .unwrap();

        let output = pipeline.run(Record::new()).unwrap();
        assert_record_value(&output, "x", &json!(3));
        assert_eq!(b.forward_calls(), 1);
    }

    #[test]
    fn test_drop_short_circuits_in_reverse() {
        let first = Arc::new(CountingTransform::new("first"));
        let dropper = Arc::new(MockTransform::new("dropper"));
        dropper.set_reverse_output(TransformOutput::Dropped);

        let pipeline = PipelineBuilder::new("p")
            .transform("first", first.clone())
            .unwrap()
            .transform("dropper", dropper.clone())
            .unwrap()
            .build()
            .unwrap();

        let output = pipeline.run_reverse(Record::new()).unwrap();
        assert_dropped(&output);
        assert_eq!(dropper.calls_in(Direction::Reverse), 1);
        assert_eq!(first.reverse_calls(), 0);
    }

    #[test]
    fn test_pair_from_terminal_stage() {
        let pipeline = PipelineBuilder::new("classify")
            .transform("A", set_x(1))
            .unwrap()
            .transform("C", top_k())
            .unwrap()
            .build()
            .unwrap();

        let output = pipeline.run(Record::new()).unwrap();
        assert_pair(&output, &[json!("a"), json!("b")], &[json!(0.9), json!(0.1)]);
    }

    #[test]
    fn test_pair_mid_run_rejected() {
        let after = Arc::new(CountingTransform::new("after"));
        let pipeline = PipelineBuilder::new("classify")
            .transform("C", top_k())
            .unwrap()
            .transform("after", after.clone())
            .unwrap()
            .build()
            .unwrap();

        let err = pipeline.run(Record::new()).unwrap_err();
        assert!(matches!(
            err,
            TransformError::NonRecordOutput { ref stage, kind: OutputKind::Pair } if stage == "C"
        ));
        assert_eq!(after.forward_calls(), 0);
    }

    #[test]
    fn test_stage_error_names_failing_stage() {
        let pipeline = PipelineBuilder::new("p")
            .transform("A", Arc::new(shift("A", "x", 1)))
            .unwrap()
            .transform("broken", Arc::new(FailingTransform::new("broken", "bad input")))
            .unwrap()
            .build()
            .unwrap();

        let err = pipeline.run(Record::new()).unwrap_err();
        match &err {
            TransformError::Stage { stage, index, direction, .. } => {
                assert_eq!(stage, "broken");
                assert_eq!(*index, 1);
                assert_eq!(*direction, Direction::Forward);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_precondition());
    }

    #[test]
    fn test_missing_key_in_reverse() {
        let pipeline = round_trip_pipeline();
        let err = pipeline.run_reverse(Record::new()).unwrap_err();

        assert_eq!(err.stage_path(), vec!["B"]);
        assert!(matches!(err.root_cause(), TransformError::MissingKey { key } if key == "x"));
    }

    #[test]
    fn test_nested_pipeline_error_chain() {
        let inner = PipelineBuilder::new("inner")
            .transform("ok", Arc::new(IdentityTransform::new("ok")))
            .unwrap()
            .transform("fails", Arc::new(FailingTransform::new("fails", "nope")))
            .unwrap()
            .build()
            .unwrap();

        let outer = PipelineBuilder::new("outer")
            .transform("A", Arc::new(shift("A", "x", 1)))
            .unwrap()
            .nest(inner)
            .unwrap()
            .build()
            .unwrap();

        let err = outer.run(Record::new()).unwrap_err();
        assert_eq!(err.stage_path(), vec!["inner", "fails"]);
        assert!(matches!(err.root_cause(), TransformError::Precondition(msg) if msg == "nope"));
    }

    #[test]
    fn test_nested_pipeline_round_trip() {
        let outer = PipelineBuilder::new("outer")
            .nest(round_trip_pipeline())
            .unwrap()
            .transform("C", Arc::new(shift("C", "x", 10)))
            .unwrap()
            .build()
            .unwrap();

        let forward = outer.run(Record::new()).unwrap().into_record().unwrap();
        assert_eq!(forward, record(json!({"x": 12})));

        let back = outer.run_reverse(forward).unwrap();
        assert_eq!(assert_record(&back), &record(json!({"x": 0})));
    }

    #[test]
    fn test_reverse_run_of_skips_stages_after_drop() {
        let a = Arc::new(MockTransform::new("A"));
        let filter = Arc::new(MockTransform::new("Filter"));
        filter.set_forward_output(TransformOutput::Dropped);
        let b = Arc::new(CountingTransform::new("B"));

        let pipeline = PipelineBuilder::new("p")
            .transform("A", a.clone())
            .unwrap()
            .transform("Filter", filter.clone())
            .unwrap()
            .transform("B", b.clone())
            .unwrap()
            .build()
            .unwrap();

        let forward = pipeline.run_traced(record(json!({"x": 1})), Direction::Forward).unwrap();
        let reverse = pipeline.reverse_run_of(record(json!({"x": 1})), &forward).unwrap();

        assert_eq!(reverse.executed_stages(), vec!["Filter", "A"]);
        assert_eq!(b.reverse_calls(), 0);
        assert_eq!(a.calls_in(Direction::Reverse), 1);
        assert_record_value(&reverse.output, "x", &json!(1));
    }

    #[test]
    fn test_reverse_run_of_rejects_foreign_run() {
        let pipeline = round_trip_pipeline();
        let other = PipelineBuilder::new("other")
            .transform("A", Arc::new(IdentityTransform::new("A")))
            .unwrap()
            .build()
            .unwrap();

        let foreign = other.run_traced(Record::new(), Direction::Forward).unwrap();
        let err = pipeline.reverse_run_of(Record::new(), &foreign).unwrap_err();
        assert!(err.is_precondition());

        let reverse = pipeline.run_traced(record(json!({"x": 2})), Direction::Reverse).unwrap();
        let err = pipeline.reverse_run_of(Record::new(), &reverse).unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn test_events_for_successful_run() {
        let sink = Arc::new(CollectingEventSink::new());
        let pipeline = PipelineBuilder::new("p")
            .transform("A", Arc::new(shift("A", "x", 1)))
            .unwrap()
            .transform("B", Arc::new(scale("B", "x", 2)))
            .unwrap()
            .with_event_sink(sink.clone())
            .build()
            .unwrap();

        pipeline.run(Record::new()).unwrap();

        assert_eq!(
            sink.event_types(),
            vec![
                "pipeline.started",
                "transform.completed",
                "transform.completed",
                "pipeline.completed",
            ]
        );
        let completed = sink.events_of_type("pipeline.completed");
        let data = completed[0].1.clone().unwrap();
        assert_eq!(data["outcome"], json!("record"));
        assert_eq!(data["executed"], json!(["A", "B"]));
    }

    #[test]
    fn test_events_for_drop_and_failure() {
        let sink = Arc::new(CollectingEventSink::new());
        let pipeline = PipelineBuilder::new("p")
            .transform("A", set_x(-1))
            .unwrap()
            .transform("Filter", non_negative())
            .unwrap()
            .with_config(PipelineConfig::new().with_trace_stages(false))
            .with_event_sink(sink.clone())
            .build()
            .unwrap();

        pipeline.run(Record::new()).unwrap();
        assert_eq!(
            sink.event_types(),
            vec!["pipeline.started", "transform.dropped", "pipeline.completed"]
        );

        sink.clear();
        let failing = PipelineBuilder::new("f")
            .transform("broken", Arc::new(FailingTransform::new("broken", "x")))
            .unwrap()
            .with_event_sink(sink.clone())
            .build()
            .unwrap();

        failing.run(Record::new()).unwrap_err();
        assert_eq!(sink.event_types(), vec!["pipeline.started", "transform.failed"]);
    }

    #[test]
    fn test_random_apply_in_pipeline_round_trip() {
        let maybe = RandomApply::new("maybe_double", Arc::new(scale("double", "x", 2)), 1.0).unwrap();
        let pipeline = PipelineBuilder::new("augment")
            .transform("A", Arc::new(shift("A", "x", 1)))
            .unwrap()
            .transform("maybe_double", Arc::new(maybe))
            .unwrap()
            .build()
            .unwrap();

        let forward = pipeline.run(Record::new()).unwrap().into_record().unwrap();
        assert_eq!(forward.get("x"), Some(&json!(2)));

        let back = pipeline.run_reverse(forward).unwrap();
        assert_eq!(assert_record(&back), &record(json!({"x": 0})));
    }

    #[test]
    fn test_pipeline_shared_across_threads() {
        let pipeline = Arc::new(round_trip_pipeline());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let pipeline = Arc::clone(&pipeline);
                std::thread::spawn(move || {
                    let output = pipeline.run(record(json!({"x": i}))).unwrap();
                    output.into_record().unwrap().require_i64("x").unwrap()
                })
            })
            .collect();

        let results: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, vec![2, 4, 6, 8]);
    }
}
