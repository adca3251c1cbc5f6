//! Mosaic step - merges all fragment DEMs.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::task::Task;
use crate::orchestrator::types::{Context, RunState};
use crate::tools::ToolCommand;

/// `dem_mosaic OPTIONS... DEMS... -o <output>/dem.tif`
pub struct DemMosaicStep;

impl DemMosaicStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DemMosaicStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for DemMosaicStep {
    fn name(&self) -> &str {
        "DemMosaic"
    }

    fn description(&self) -> &str {
        "DEM mosaic"
    }

    fn is_enabled(&self, ctx: &Context) -> bool {
        ctx.config.dem_mosaic.is_some()
    }

    fn validate_input(&self, ctx: &Context, _state: &RunState) -> StepResult<()> {
        if ctx.pairs.is_empty() {
            return Err(StepError::invalid_input("no fragment to mosaic"));
        }
        Ok(())
    }

    fn plan(&self, ctx: &Context, _state: &RunState) -> StepResult<Vec<Task>> {
        let mosaic = ctx.layout.mosaic();
        let mut command = ToolCommand::new("dem_mosaic");
        if let Some(ref config) = ctx.config.dem_mosaic {
            command = command.options(&config.options);
        }
        for pair in &ctx.pairs {
            command = command.path(&ctx.layout.fragment(pair).dem());
        }
        let command = command.arg("-o").path(&mosaic).output(&mosaic);

        Ok(vec![Task::invoke("mosaic", command).with_fingerprint(mosaic)])
    }
}
