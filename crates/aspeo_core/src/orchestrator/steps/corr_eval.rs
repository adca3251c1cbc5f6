//! Correlation evaluation step - NCC of each pixel tracking result.

use crate::orchestrator::errors::StepResult;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::task::Task;
use crate::orchestrator::types::{Context, RunState};
use crate::tools::ToolCommand;

/// `corr_eval OPTIONS... LEFT RIGHT DISPARITY OUTPUT_PREFIX` per pair.
///
/// Keyed on `<fragment>-ncc.tif`, independently of the stereo step.
pub struct CorrEvalStep;

impl CorrEvalStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CorrEvalStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for CorrEvalStep {
    fn name(&self) -> &str {
        "CorrEval"
    }

    fn description(&self) -> &str {
        "Correlation evaluation (ncc)"
    }

    fn is_enabled(&self, ctx: &Context) -> bool {
        ctx.config.corr_eval.is_some()
    }

    fn validate_input(&self, _ctx: &Context, _state: &RunState) -> StepResult<()> {
        Ok(())
    }

    fn plan(&self, ctx: &Context, _state: &RunState) -> StepResult<Vec<Task>> {
        let options = ctx
            .config
            .corr_eval
            .as_ref()
            .map(|c| c.options.clone())
            .unwrap_or_default();

        Ok(ctx
            .pairs
            .iter()
            .map(|pair| {
                let fragment = ctx.layout.fragment(pair);
                let ncc = fragment.ncc();
                let command = ToolCommand::new("corr_eval")
                    .options(&options)
                    .path(&fragment.left())
                    .path(&fragment.right())
                    .path(&fragment.disparity())
                    .path(fragment.prefix())
                    .output(&ncc);
                Task::invoke(pair.stem(), command).with_fingerprint(ncc)
            })
            .collect())
    }
}
