//! Per-run trace of a pipeline execution.

use crate::core::{Direction, OutputKind, TransformOutput};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened at one stage of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage name.
    pub name: String,
    /// Position of the stage in the pipeline.
    pub index: usize,
    /// The kind of output the stage produced.
    pub outcome: OutputKind,
    /// Time spent in the stage.
    pub duration_ms: f64,
}

/// The result of running a pipeline over one record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Unique ID of this run.
    pub run_id: Uuid,
    /// Name of the pipeline.
    pub pipeline: String,
    /// Direction of the run.
    pub direction: Direction,
    /// Final output.
    pub output: TransformOutput,
    /// Stages that were invoked, in invocation order.
    pub stages: Vec<StageRecord>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run ended.
    pub ended_at: DateTime<Utc>,
}

impl PipelineRun {
    /// Returns the names of the invoked stages, in invocation order.
    #[must_use]
    pub fn executed_stages(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Returns the stage that dropped the record, if any.
    #[must_use]
    pub fn dropped_at(&self) -> Option<&StageRecord> {
        self.stages
            .iter()
            .find(|s| s.outcome == OutputKind::Dropped)
    }

    /// Returns true if the record was dropped.
    #[must_use]
    pub fn is_dropped(&self) -> bool {
        self.output.is_dropped()
    }

    /// Returns the run duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        (self.ended_at - self.started_at).num_microseconds().unwrap_or(i64::MAX) as f64 / 1000.0
    }

    /// Consumes the run, returning its output.
    #[must_use]
    pub fn into_output(self) -> TransformOutput {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn sample_run() -> PipelineRun {
        let started_at = Utc::now();
        PipelineRun {
            run_id: Uuid::new_v4(),
            pipeline: "augment".to_string(),
            direction: Direction::Forward,
            output: TransformOutput::Dropped,
            stages: vec![
                StageRecord {
                    name: "load".to_string(),
                    index: 0,
                    outcome: OutputKind::Record,
                    duration_ms: 0.2,
                },
                StageRecord {
                    name: "filter".to_string(),
                    index: 1,
                    outcome: OutputKind::Dropped,
                    duration_ms: 0.1,
                },
            ],
            started_at,
            ended_at: started_at + chrono::Duration::milliseconds(3),
        }
    }

    #[test]
    fn test_executed_and_dropped() {
        let run = sample_run();
        assert_eq!(run.executed_stages(), vec!["load", "filter"]);
        assert_eq!(run.dropped_at().map(|s| s.index), Some(1));
        assert!(run.is_dropped());
        assert!((run.duration_ms() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut run = sample_run();
        run.output = TransformOutput::Record([("x", 1)].into_iter().collect::<Record>());

        let json = serde_json::to_string(&run).unwrap();
        let back: PipelineRun = serde_json::from_str(&json).unwrap();

        assert_eq!(back.run_id, run.run_id);
        assert_eq!(back.stages, run.stages);
        assert_eq!(back.output, run.output);
    }
}
