//! Pipeline runner that executes steps in sequence.

use std::path::PathBuf;

use serde::Serialize;

use super::errors::{PipelineError, PipelineResult};
use super::step::PipelineStep;
use super::types::{Context, RunState, StepOutcome};

/// Pipeline that runs a sequence of steps.
///
/// The pipeline executes steps in dependency order, running validation
/// before and after each enabled step. The first error aborts the run.
pub struct Pipeline {
    /// Steps to execute in order.
    steps: Vec<Box<dyn PipelineStep>>,
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Add a step to the pipeline.
    pub fn add_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Add a step (builder pattern).
    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Run the pipeline with the given context and state.
    ///
    /// For each step:
    /// 1. Skip it if its stage is not configured
    /// 2. Run `validate_input`
    /// 3. Run `execute`
    /// 4. Run `validate_output` (if execute returned Success)
    pub fn run(&self, ctx: &Context, state: &mut RunState) -> PipelineResult<PipelineRunResult> {
        let mut result = PipelineRunResult {
            workflow: ctx.workflow_name.clone(),
            ..Default::default()
        };

        for step in &self.steps {
            let step_name = step.name();

            if !step.is_enabled(ctx) {
                ctx.logger
                    .debug(&format!("{} not configured, skipping", step_name));
                result.steps_skipped.push(step_name.to_string());
                continue;
            }

            ctx.logger.phase(step.description());

            ctx.logger.debug(&format!("Validating input for '{}'", step_name));
            if let Err(e) = step.validate_input(ctx, state) {
                ctx.logger.error(&format!("Input validation failed: {}", e));
                return Err(PipelineError::step_failed(&ctx.workflow_name, step_name, e));
            }

            ctx.logger.debug(&format!("Executing '{}'", step_name));
            let outcome = step.execute(ctx, state).map_err(|e| {
                ctx.logger.error(&format!("Execution failed: {}", e));
                PipelineError::step_failed(&ctx.workflow_name, step_name, e)
            })?;

            match outcome {
                StepOutcome::Success => {
                    if let Err(e) = step.validate_output(ctx, state) {
                        ctx.logger.error(&format!("Output validation failed: {}", e));
                        return Err(PipelineError::step_failed(&ctx.workflow_name, step_name, e));
                    }

                    ctx.logger.success(&format!("{} completed", step_name));
                    result.steps_completed.push(step_name.to_string());
                }
                StepOutcome::Skipped(reason) => {
                    ctx.logger.skip(&format!("{}: {}", step_name, reason));
                    result.steps_skipped.push(step_name.to_string());
                }
            }
        }

        result.tasks_executed = state.tasks_executed;
        result.tasks_skipped = state.tasks_skipped;
        result.bundle_adjust_prefix = state.bundle_adjust_prefix.clone();
        result.dem = state.dem.clone();

        ctx.logger.success(&format!(
            "Workflow '{}' completed: {} task(s) run, {} already done",
            ctx.workflow_name, result.tasks_executed, result.tasks_skipped
        ));

        Ok(result)
    }

    /// Get the number of steps in the pipeline.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Get step names in order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineRunResult {
    /// Workflow name.
    pub workflow: String,
    /// Steps that completed successfully.
    pub steps_completed: Vec<String>,
    /// Steps that were not configured or did not apply.
    pub steps_skipped: Vec<String>,
    /// Units of work run.
    pub tasks_executed: usize,
    /// Units of work skipped because their output existed.
    pub tasks_skipped: usize,
    /// Bundle adjustment prefix used by map projection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_adjust_prefix: Option<PathBuf>,
    /// Reference elevation model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dem: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkflowConfig;
    use crate::logging::RunLogger;
    use crate::orchestrator::errors::{StepError, StepResult};
    use crate::orchestrator::task::Task;
    use crate::tools::{RecordingRunner, ToolCommand};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingStep {
        name: &'static str,
        enabled: bool,
        fail: bool,
        plan_count: Arc<AtomicUsize>,
    }

    impl CountingStep {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                enabled: true,
                fail: false,
                plan_count: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl PipelineStep for CountingStep {
        fn name(&self) -> &str {
            self.name
        }

        fn is_enabled(&self, _ctx: &Context) -> bool {
            self.enabled
        }

        fn validate_input(&self, _ctx: &Context, _state: &RunState) -> StepResult<()> {
            if self.fail {
                return Err(StepError::invalid_input("missing camera"));
            }
            Ok(())
        }

        fn plan(&self, _ctx: &Context, _state: &RunState) -> StepResult<Vec<Task>> {
            self.plan_count.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Task::invoke(self.name, ToolCommand::new(self.name))])
        }
    }

    fn context(runner: Arc<RecordingRunner>) -> Context {
        Context::new(
            "test",
            WorkflowConfig::default(),
            Vec::new(),
            Vec::new(),
            runner,
            Arc::new(RunLogger::console("test")),
        )
    }

    #[test]
    fn pipeline_builds_correctly() {
        let pipeline = Pipeline::new()
            .with_step(CountingStep::new("Step1"))
            .with_step(CountingStep::new("Step2"));

        assert_eq!(pipeline.step_count(), 2);
        assert_eq!(pipeline.step_names(), vec!["Step1", "Step2"]);
    }

    #[test]
    fn disabled_steps_are_skipped_without_planning() {
        let disabled = CountingStep {
            enabled: false,
            ..CountingStep::new("disabled")
        };
        let disabled_count = Arc::clone(&disabled.plan_count);
        let pipeline = Pipeline::new()
            .with_step(disabled)
            .with_step(CountingStep::new("enabled"));

        let runner = Arc::new(RecordingRunner::new());
        let ctx = context(runner.clone());
        let mut state = RunState::new("test", &ctx.config);
        let result = pipeline.run(&ctx, &mut state).unwrap();

        assert_eq!(result.steps_completed, vec!["enabled"]);
        assert_eq!(result.steps_skipped, vec!["disabled"]);
        assert_eq!(result.tasks_executed, 1);
        assert_eq!(disabled_count.load(Ordering::SeqCst), 0);
        assert_eq!(runner.count("enabled"), 1);
    }

    #[test]
    fn failing_step_stops_pipeline() {
        let failing = CountingStep {
            fail: true,
            ..CountingStep::new("Stereo")
        };
        let pipeline = Pipeline::new()
            .with_step(failing)
            .with_step(CountingStep::new("CorrEval"));

        let runner = Arc::new(RecordingRunner::new());
        let ctx = context(runner.clone());
        let mut state = RunState::new("test", &ctx.config);
        let err = pipeline.run(&ctx, &mut state).unwrap_err();

        assert!(err.to_string().contains("failed at step 'Stereo'"));
        assert!(runner.is_empty());
    }
}
