//! Pipeline builder with validation.

use super::compose::Pipeline;
use super::config::PipelineConfig;
use super::spec::TransformSpec;
use crate::errors::{ContractErrorInfo, PipelineValidationError};
use crate::events::EventSink;
use crate::transforms::Transform;
use std::collections::HashSet;
use std::sync::Arc;

/// Builder for creating validated pipelines.
#[derive(Clone)]
pub struct PipelineBuilder {
    /// The pipeline name.
    name: String,
    /// The stages, in forward order.
    stages: Vec<TransformSpec>,
    /// Stage names seen so far.
    names: HashSet<String>,
    config: PipelineConfig,
    event_sink: Option<Arc<dyn EventSink>>,
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .field("config", &self.config)
            .field("event_sink", &self.event_sink.is_some())
            .finish()
    }
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            names: HashSet::new(),
            config: PipelineConfig::default(),
            event_sink: None,
        }
    }

    /// Appends a transform under the given stage name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or already used in this pipeline.
    pub fn transform(
        mut self,
        name: impl Into<String>,
        transform: Arc<dyn Transform>,
    ) -> Result<Self, PipelineValidationError> {
        self.add_spec(TransformSpec::new(name, transform))?;
        Ok(self)
    }

    /// Appends a stage specification.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or already used in this pipeline.
    pub fn add_spec(&mut self, spec: TransformSpec) -> Result<(), PipelineValidationError> {
        spec.validate()?;

        if self.names.contains(&spec.name) {
            return Err(PipelineValidationError::new(format!(
                "Transform '{}' is already registered in pipeline '{}'",
                spec.name, self.name
            ))
            .with_stages(vec![spec.name.clone()])
            .with_error_info(
                ContractErrorInfo::new("TRANSFLOW-DUPLICATE", "Duplicate transform name")
                    .with_fix_hint("Register each transform under a distinct name.")
                    .with_context_entry("pipeline", self.name.clone()),
            ));
        }

        self.names.insert(spec.name.clone());
        self.stages.push(spec);
        Ok(())
    }

    /// Appends every stage of another builder, in its order.
    ///
    /// The other builder's configuration and event sink are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if a stage name of `other` is already used here.
    pub fn compose(mut self, other: PipelineBuilder) -> Result<Self, PipelineValidationError> {
        for spec in other.stages {
            self.add_spec(spec)?;
        }
        Ok(self)
    }

    /// Appends a built pipeline as a single stage named after it.
    ///
    /// # Errors
    ///
    /// Returns an error if the nested pipeline's name is already used here.
    pub fn nest(self, pipeline: Pipeline) -> Result<Self, PipelineValidationError> {
        let name = pipeline.name().to_string();
        self.transform(name, Arc::new(pipeline))
    }

    /// Sets the pipeline configuration.
    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the event sink. Without one, the global sink is used.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Returns the registered stage names, in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline name is blank or no transform was added.
    pub fn build(self) -> Result<Pipeline, PipelineValidationError> {
        if self.name.trim().is_empty() {
            return Err(PipelineValidationError::new(
                "Pipeline name cannot be empty or whitespace-only",
            )
            .with_error_info(
                ContractErrorInfo::new("TRANSFLOW-EMPTY-NAME", "Empty pipeline name")
                    .with_fix_hint("Give the pipeline a non-blank name."),
            ));
        }

        if self.stages.is_empty() {
            return Err(PipelineValidationError::new(format!(
                "Pipeline '{}' has no transforms",
                self.name
            ))
            .with_error_info(
                ContractErrorInfo::new("TRANSFLOW-EMPTY", "Empty pipeline")
                    .with_fix_hint("Add at least one transform before building."),
            ));
        }

        Ok(Pipeline::new(
            self.name,
            self.stages,
            self.config,
            self.event_sink,
        ))
    }
}
