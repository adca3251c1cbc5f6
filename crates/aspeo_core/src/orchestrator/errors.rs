//! Error types for the orchestrator pipeline.
//!
//! Errors carry context that chains through layers:
//! Workflow → Step → Operation → Detail

use std::io;
use std::path::Path;

use thiserror::Error;

use crate::resolve::ResolveError;
use crate::tools::ToolError;

/// Top-level pipeline error with workflow context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed during execution.
    #[error("Workflow '{workflow_name}' failed at step '{step_name}': {source}")]
    StepFailed {
        workflow_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// Sources or pairs could not be resolved; no step has run.
    #[error("Workflow '{workflow_name}' could not resolve its inputs: {source}")]
    ResolutionFailed {
        workflow_name: String,
        #[source]
        source: ResolveError,
    },

    /// Input validation failed before pipeline started.
    #[error("Workflow '{workflow_name}' failed validation: {message}")]
    ValidationFailed {
        workflow_name: String,
        message: String,
    },
}

impl PipelineError {
    /// Create a step failed error.
    pub fn step_failed(
        workflow_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            workflow_name: workflow_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    /// Create a resolution failed error.
    pub fn resolution_failed(workflow_name: impl Into<String>, source: ResolveError) -> Self {
        Self::ResolutionFailed {
            workflow_name: workflow_name.into(),
            source,
        }
    }

    /// Create a validation failed error.
    pub fn validation_failed(
        workflow_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ValidationFailed {
            workflow_name: workflow_name.into(),
            message: message.into(),
        }
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// An external tool could not be run or exited with an error.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// Resolution work done inside a step (bbox, metadata).
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// A required file was not found.
    #[error("Required file not found: {path}")]
    FileNotFound { path: String },

    /// A precondition was not met.
    #[error("Precondition not met: {0}")]
    PreconditionFailed(String),
}

impl StepError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an I/O error with context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: &Path) -> Self {
        Self::FileNotFound {
            path: path.display().to_string(),
        }
    }

    /// Create a precondition failed error.
    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
