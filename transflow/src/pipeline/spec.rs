//! Stage specifications.

use crate::errors::{ContractErrorInfo, PipelineValidationError};
use crate::transforms::Transform;
use std::sync::Arc;

/// A transform registered in a pipeline under a stage name.
#[derive(Debug, Clone)]
pub struct TransformSpec {
    /// The unique name of the stage.
    pub name: String,
    /// The transform implementation.
    pub transform: Arc<dyn Transform>,
}

impl TransformSpec {
    /// Creates a new stage specification.
    #[must_use]
    pub fn new(name: impl Into<String>, transform: Arc<dyn Transform>) -> Self {
        Self {
            name: name.into(),
            transform,
        }
    }

    /// Creates a specification named after the transform itself.
    #[must_use]
    pub fn from_transform(transform: Arc<dyn Transform>) -> Self {
        let name = transform.name().to_string();
        Self { name, transform }
    }

    /// Validates the stage specification.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage name is empty or whitespace-only.
    pub fn validate(&self) -> Result<(), PipelineValidationError> {
        if self.name.trim().is_empty() {
            return Err(PipelineValidationError::new(
                "Transform name cannot be empty or whitespace-only",
            )
            .with_error_info(
                ContractErrorInfo::new("TRANSFLOW-EMPTY-NAME", "Empty transform name")
                    .with_fix_hint("Give every transform a non-blank name."),
            ));
        }
        Ok(())
    }
}
