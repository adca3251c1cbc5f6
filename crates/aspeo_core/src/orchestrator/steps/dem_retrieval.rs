//! DEM retrieval step - fetches a reference elevation model covering all
//! sources when none is configured.

use crate::config::{DemRetrievalConfig, Stage};
use crate::geo::aggregate_bbox;
use crate::geo::dem::{probe_command, retrieval_command};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::task::Task;
use crate::orchestrator::types::{Context, RunState};

/// Retrieves `DEM/reference-dem.tif` from the merged source footprint.
///
/// Enabled only when `dem` is absent and one of the stages that consume
/// it is configured.
pub struct DemRetrievalStep {
    consumers: Vec<Stage>,
}

impl DemRetrievalStep {
    /// Retrieve a DEM when any of `consumers` is configured.
    pub fn for_stages(consumers: impl IntoIterator<Item = Stage>) -> Self {
        Self {
            consumers: consumers.into_iter().collect(),
        }
    }

    fn config(ctx: &Context) -> DemRetrievalConfig {
        ctx.config.dem_retrieval.clone().unwrap_or_default()
    }
}

impl PipelineStep for DemRetrievalStep {
    fn name(&self) -> &str {
        "DemRetrieval"
    }

    fn description(&self) -> &str {
        "Reference DEM retrieval"
    }

    fn is_enabled(&self, ctx: &Context) -> bool {
        ctx.config.dem.is_none() && self.consumers.iter().any(|s| ctx.config.has_stage(*s))
    }

    fn validate_input(&self, ctx: &Context, _state: &RunState) -> StepResult<()> {
        let config = Self::config(ctx);
        ctx.logger.info("dem is not provided in parameters");
        if !ctx.runner.probe(&probe_command(&config)) {
            return Err(StepError::precondition_failed(format!(
                "{} is not available for DEM retrieval",
                config.command
            )));
        }
        Ok(())
    }

    fn plan(&self, ctx: &Context, _state: &RunState) -> StepResult<Vec<Task>> {
        let bbox = aggregate_bbox(&ctx.sources)?;
        ctx.logger.info(&format!(
            "Retrieving DEM for lon [{}, {}] lat [{}, {}]",
            bbox.min_lon, bbox.max_lon, bbox.min_lat, bbox.max_lat
        ));

        let output = ctx.layout.reference_dem();
        let command = retrieval_command(&Self::config(ctx), &output, &bbox);
        Ok(vec![Task::invoke("dem", command).with_fingerprint(output)])
    }

    fn record(&self, ctx: &Context, state: &mut RunState) -> StepResult<()> {
        state.dem = Some(ctx.layout.reference_dem());
        Ok(())
    }

    fn validate_output(&self, ctx: &Context, state: &RunState) -> StepResult<()> {
        let dem = state.require_dem()?;
        if !ctx.is_dry_run() && !dem.exists() {
            return Err(StepError::file_not_found(dem));
        }
        Ok(())
    }
}
