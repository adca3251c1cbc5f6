//! Pipeline orchestrator for coordinating workflow execution.
//!
//! Each workflow is a fixed sequence of steps. A step is enabled by the
//! presence of its stage table in the configuration, plans a list of
//! idempotent tasks, and records what later steps need.
//!
//! # Architecture
//!
//! ```text
//! Workflow::run
//!     ├── validate configuration
//!     ├── resolve sources and pairs
//!     └── Pipeline
//!             ├── Step ── plan ──> [Task, Task, ...]
//!             │                      └── execute_tasks (skip if fingerprint exists)
//!             └── ...
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use aspeo_core::config::ConfigManager;
//! use aspeo_core::logging::RunLogger;
//! use aspeo_core::orchestrator::Workflow;
//! use aspeo_core::tools::ProcessRunner;
//!
//! let mut manager = ConfigManager::new("dsm.toml");
//! manager.load().unwrap();
//!
//! let result = Workflow::Dsm
//!     .run(
//!         manager.into_config(),
//!         Arc::new(ProcessRunner::new()),
//!         Arc::new(RunLogger::console("dsm")),
//!     )
//!     .unwrap();
//! println!("Completed: {:?}", result.steps_completed);
//! ```

mod errors;
mod pipeline;
mod step;
pub mod steps;
mod task;
mod types;
mod workflows;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{Pipeline, PipelineRunResult};
pub use step::PipelineStep;
pub use task::{execute_tasks, Task, TaskAction, TaskSummary};
pub use types::{Context, RunState, StepOutcome};
pub use workflows::{
    locate_map_projected, run_dsm, run_map_projection, run_pixel_tracking, Workflow,
    PIXEL_TRACKING_COLUMNS,
};
