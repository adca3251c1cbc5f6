//! Rasterization step - one DEM per fragment.

use crate::orchestrator::errors::StepResult;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::task::Task;
use crate::orchestrator::types::{Context, RunState};
use crate::tools::ToolCommand;

/// `point2dem OPTIONS... <fragment>-pc_aligned.tif -o <fragment>-dem.tif`
pub struct Point2DemStep;

impl Point2DemStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Point2DemStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for Point2DemStep {
    fn name(&self) -> &str {
        "Point2Dem"
    }

    fn description(&self) -> &str {
        "Point cloud rasterization"
    }

    fn is_enabled(&self, ctx: &Context) -> bool {
        ctx.config.point2dem.is_some()
    }

    fn validate_input(&self, _ctx: &Context, _state: &RunState) -> StepResult<()> {
        Ok(())
    }

    fn plan(&self, ctx: &Context, _state: &RunState) -> StepResult<Vec<Task>> {
        let options = ctx
            .config
            .point2dem
            .as_ref()
            .map(|c| c.options.clone())
            .unwrap_or_default();

        Ok(ctx
            .pairs
            .iter()
            .map(|pair| {
                let fragment = ctx.layout.fragment(pair);
                let output = fragment.dem();
                let command = ToolCommand::new("point2dem")
                    .options(&options)
                    .path(&fragment.aligned_cloud())
                    .arg("-o")
                    .path(&output)
                    .output(&output);
                Task::invoke(pair.stem(), command).with_fingerprint(output)
            })
            .collect())
    }
}
