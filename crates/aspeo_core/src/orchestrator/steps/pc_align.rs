//! Point cloud alignment step.

use crate::orchestrator::errors::StepResult;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::task::Task;
use crate::orchestrator::types::{Context, RunState};
use crate::tools::ToolCommand;

/// `pc_align OPTIONS... DEM <fragment>-pc.tif -o <fragment>-pc_aligned.tif`
pub struct PcAlignStep;

impl PcAlignStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PcAlignStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for PcAlignStep {
    fn name(&self) -> &str {
        "PcAlign"
    }

    fn description(&self) -> &str {
        "Point cloud alignment"
    }

    fn is_enabled(&self, ctx: &Context) -> bool {
        ctx.config.pc_align.is_some()
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        state.require_dem().map(|_| ())
    }

    fn plan(&self, ctx: &Context, state: &RunState) -> StepResult<Vec<Task>> {
        let dem = state.require_dem()?;
        let options = ctx
            .config
            .pc_align
            .as_ref()
            .map(|c| c.options.clone())
            .unwrap_or_default();

        Ok(ctx
            .pairs
            .iter()
            .map(|pair| {
                let fragment = ctx.layout.fragment(pair);
                let output = fragment.aligned_cloud();
                let command = ToolCommand::new("pc_align")
                    .options(&options)
                    .path(dem)
                    .path(&fragment.point_cloud())
                    .arg("-o")
                    .path(&output)
                    .output(&output);
                Task::invoke(pair.stem(), command).with_fingerprint(output)
            })
            .collect())
    }
}
