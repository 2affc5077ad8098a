//! Sequential pipeline execution.
//!
//! Threads one record through the registered transforms. A dropped record
//! stops the run; a pair can only come from the last stage visited.

use super::config::{PipelineConfig, ReverseOrder};
use super::run::{PipelineRun, StageRecord};
use super::spec::TransformSpec;
use crate::core::{Direction, OutputKind, TransformOutput, TransformResult};
use crate::errors::TransformError;
use crate::events::{get_event_sink, EventSink};
use crate::observability::{pipeline_span, transform_span};
use crate::record::Record;
use crate::transforms::{Transform, TransformExt};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// An ordered sequence of transforms applied to one record at a time.
///
/// A pipeline keeps no per-record state, so it can be shared across threads
/// that process independent records. It is itself a [`Transform`], which lets
/// pipelines nest.
pub struct Pipeline {
    name: String,
    stages: Vec<TransformSpec>,
    config: PipelineConfig,
    event_sink: Option<Arc<dyn EventSink>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub(crate) fn new(
        name: String,
        stages: Vec<TransformSpec>,
        config: PipelineConfig,
        event_sink: Option<Arc<dyn EventSink>>,
    ) -> Self {
        Self {
            name,
            stages,
            config,
            event_sink,
        }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the pipeline has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns the stage names in forward order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Returns the pipeline configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every stage forward.
    ///
    /// # Errors
    ///
    /// Returns the failing stage's error wrapped with its identity, or
    /// `NonRecordOutput` if a stage other than the last returns a pair.
    pub fn run(&self, record: Record) -> TransformResult {
        self.run_traced(record, Direction::Forward)
            .map(PipelineRun::into_output)
    }

    /// Runs every stage in reverse, in the configured [`ReverseOrder`].
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub fn run_reverse(&self, record: Record) -> TransformResult {
        self.run_traced(record, Direction::Reverse)
            .map(PipelineRun::into_output)
    }

    /// Runs the pipeline in `direction` and returns the output with a per-stage trace.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub fn run_traced(&self, record: Record, direction: Direction) -> Result<PipelineRun, TransformError> {
        let order = self.traversal(direction, (0..self.stages.len()).collect());
        self.execute(record, direction, &order)
    }

    /// Reverses only the stages that were invoked by a recorded forward run.
    ///
    /// # Errors
    ///
    /// Returns a precondition error if `forward` is not a forward run of this
    /// pipeline, otherwise the same errors as [`run`](Self::run).
    pub fn reverse_run_of(&self, record: Record, forward: &PipelineRun) -> Result<PipelineRun, TransformError> {
        if forward.direction != Direction::Forward {
            return Err(TransformError::precondition(format!(
                "run {} is a {} run, expected forward",
                forward.run_id, forward.direction
            )));
        }

        let mut seen = HashSet::new();
        let foreign = forward.pipeline != self.name
            || forward.stages.iter().any(|stage| {
                !seen.insert(stage.index)
                    || self
                        .stages
                        .get(stage.index)
                        .map_or(true, |spec| spec.name != stage.name)
            });
        if foreign {
            return Err(TransformError::precondition(format!(
                "run {} was not produced by pipeline '{}'",
                forward.run_id, self.name
            )));
        }

        let mut executed: Vec<usize> = forward.stages.iter().map(|s| s.index).collect();
        executed.sort_unstable();
        let order = self.traversal(Direction::Reverse, executed);
        self.execute(record, Direction::Reverse, &order)
    }

    /// Orders stage indices (given in forward order) for a run in `direction`.
    fn traversal(&self, direction: Direction, mut indices: Vec<usize>) -> Vec<usize> {
        if direction.is_reverse() && self.config.reverse_order == ReverseOrder::Mirror {
            indices.reverse();
        }
        indices
    }

    fn sink(&self) -> Arc<dyn EventSink> {
        self.event_sink.clone().unwrap_or_else(get_event_sink)
    }

    fn execute(&self, record: Record, direction: Direction, order: &[usize]) -> Result<PipelineRun, TransformError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let span = pipeline_span(&self.name, run_id, direction);
        let _entered = span.enter();
        let sink = self.sink();

        sink.try_emit(
            "pipeline.started",
            Some(serde_json::json!({
                "pipeline": self.name,
                "run_id": run_id.to_string(),
                "direction": direction,
                "stages": order.len(),
            })),
        );

        let mut stages = Vec::with_capacity(order.len());
        let mut record = record;

        for (position, &index) in order.iter().enumerate() {
            let spec = &self.stages[index];
            let stage_span = transform_span(&spec.name, index);
            let _stage_entered = stage_span.enter();

            let start = Instant::now();
            let result = spec.transform.invoke(record, direction.is_reverse());
            let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

            let output = match result {
                Ok(output) => output,
                Err(err) => {
                    warn!(error = %err, "Transform failed");
                    self.emit_stage(sink.as_ref(), "transform.failed", run_id, spec, index, direction, None);
                    return Err(err.in_stage(&spec.name, index, direction));
                }
            };

            let outcome = output.kind();
            stages.push(StageRecord {
                name: spec.name.clone(),
                index,
                outcome,
                duration_ms,
            });

            match output {
                TransformOutput::Record(next) => {
                    debug!(duration_ms, "Transform completed");
                    if self.config.trace_stages {
                        self.emit_stage(sink.as_ref(), "transform.completed", run_id, spec, index, direction, Some(outcome));
                    }
                    record = next;
                }
                TransformOutput::Dropped => {
                    info!("Record dropped");
                    self.emit_stage(sink.as_ref(), "transform.dropped", run_id, spec, index, direction, Some(outcome));
                    return Ok(self.finish(sink.as_ref(), run_id, direction, TransformOutput::Dropped, stages, started_at));
                }
                pair @ TransformOutput::Pair(..) => {
                    if position + 1 != order.len() {
                        warn!("Pair output before the last transform");
                        self.emit_stage(sink.as_ref(), "transform.failed", run_id, spec, index, direction, Some(outcome));
                        return Err(TransformError::NonRecordOutput {
                            stage: spec.name.clone(),
                            kind: OutputKind::Pair,
                        });
                    }
                    debug!(duration_ms, "Transform completed with pair output");
                    if self.config.trace_stages {
                        self.emit_stage(sink.as_ref(), "transform.completed", run_id, spec, index, direction, Some(outcome));
                    }
                    return Ok(self.finish(sink.as_ref(), run_id, direction, pair, stages, started_at));
                }
            }
        }

        Ok(self.finish(
            sink.as_ref(),
            run_id,
            direction,
            TransformOutput::Record(record),
            stages,
            started_at,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_stage(
        &self,
        sink: &dyn EventSink,
        event_type: &str,
        run_id: Uuid,
        spec: &TransformSpec,
        index: usize,
        direction: Direction,
        outcome: Option<OutputKind>,
    ) {
        sink.try_emit(
            event_type,
            Some(serde_json::json!({
                "pipeline": self.name,
                "run_id": run_id.to_string(),
                "stage": spec.name,
                "index": index,
                "direction": direction,
                "outcome": outcome,
            })),
        );
    }

    fn finish(
        &self,
        sink: &dyn EventSink,
        run_id: Uuid,
        direction: Direction,
        output: TransformOutput,
        stages: Vec<StageRecord>,
        started_at: chrono::DateTime<Utc>,
    ) -> PipelineRun {
        let run = PipelineRun {
            run_id,
            pipeline: self.name.clone(),
            direction,
            output,
            stages,
            started_at,
            ended_at: Utc::now(),
        };

        debug!(outcome = %run.output.kind(), stages = run.stages.len(), "Pipeline run finished");
        sink.try_emit(
            "pipeline.completed",
            Some(serde_json::json!({
                "pipeline": self.name,
                "run_id": run_id.to_string(),
                "direction": direction,
                "outcome": run.output.kind(),
                "executed": run.executed_stages(),
                "duration_ms": run.duration_ms(),
            })),
        );

        run
    }
}

impl Transform for Pipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, record: Record) -> TransformResult {
        self.run(record)
    }

    fn reverse(&self, record: Record) -> TransformResult {
        self.run_reverse(record)
    }
}
