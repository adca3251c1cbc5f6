//! Pipeline step trait definition.
//!
//! All pipeline steps implement this trait, providing a consistent
//! interface for validation, planning and execution.

use super::errors::StepResult;
use super::task::{execute_tasks, Task};
use super::types::{Context, RunState, StepOutcome};

/// Trait for pipeline steps.
///
/// Each step in the pipeline implements this trait. The pipeline runner
/// calls these methods in order:
///
/// 1. `is_enabled` - Whether the workflow configures this stage at all
/// 2. `validate_input` - Check preconditions before execution
/// 3. `execute` - Plan the step's tasks, run those not yet done, record
///    derived state
/// 4. `validate_output` - Verify the step left what later steps need
///
/// Most steps only implement `plan`; `execute` drives the task executor.
///
/// # Example
///
/// ```ignore
/// struct OrbitvizStep;
///
/// impl PipelineStep for OrbitvizStep {
///     fn name(&self) -> &str { "Orbitviz" }
///
///     fn is_enabled(&self, ctx: &Context) -> bool {
///         ctx.config.orbitviz.is_some()
///     }
///
///     fn validate_input(&self, ctx: &Context, _state: &RunState) -> StepResult<()> {
///         require_field(ctx, SourceField::Cam)
///     }
///
///     fn plan(&self, ctx: &Context, _state: &RunState) -> StepResult<Vec<Task>> {
///         let kml = ctx.layout.orbits_kml();
///         Ok(vec![Task::invoke("orbits", orbitviz_command(ctx, &kml)).with_fingerprint(kml)])
///     }
/// }
/// ```
pub trait PipelineStep: Send + Sync {
    /// Get the step name (for logging and error context).
    fn name(&self) -> &str;

    /// Whether the stage is configured for this run.
    ///
    /// Disabled steps are reported as skipped without any other call.
    fn is_enabled(&self, ctx: &Context) -> bool;

    /// Validate inputs before execution.
    fn validate_input(&self, ctx: &Context, state: &RunState) -> StepResult<()>;

    /// Units of work of this step, in execution order.
    fn plan(&self, ctx: &Context, state: &RunState) -> StepResult<Vec<Task>>;

    /// Reason to skip an enabled step, if it does not apply to this run.
    fn skip_reason(&self, _ctx: &Context, _state: &RunState) -> Option<String> {
        None
    }

    /// Record derived values for later steps.
    ///
    /// Runs after the tasks, also when all of them were skipped.
    fn record(&self, _ctx: &Context, _state: &mut RunState) -> StepResult<()> {
        Ok(())
    }

    /// Execute the step's main work.
    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        if let Some(reason) = self.skip_reason(ctx, state) {
            return Ok(StepOutcome::Skipped(reason));
        }

        let tasks = self.plan(ctx, state)?;
        let summary = execute_tasks(ctx, &tasks)?;
        state.tasks_executed += summary.executed;
        state.tasks_skipped += summary.skipped;

        self.record(ctx, state)?;
        Ok(StepOutcome::Success)
    }

    /// Validate outputs after execution.
    fn validate_output(&self, _ctx: &Context, _state: &RunState) -> StepResult<()> {
        Ok(())
    }

    /// Human-readable description of what this step does.
    fn description(&self) -> &str {
        self.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockStep {
        name: &'static str,
        enabled: bool,
    }

    impl PipelineStep for MockStep {
        fn name(&self) -> &str {
            self.name
        }

        fn is_enabled(&self, _ctx: &Context) -> bool {
            self.enabled
        }

        fn validate_input(&self, _ctx: &Context, _state: &RunState) -> StepResult<()> {
            Ok(())
        }

        fn plan(&self, _ctx: &Context, _state: &RunState) -> StepResult<Vec<Task>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn step_trait_object_works() {
        let step: Box<dyn PipelineStep> = Box::new(MockStep {
            name: "TestStep",
            enabled: true,
        });

        assert_eq!(step.name(), "TestStep");
        assert_eq!(step.description(), "TestStep");
    }
}
