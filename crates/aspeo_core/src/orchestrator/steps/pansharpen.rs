//! Pansharpen step - merges map-projected pan and ms products.

use crate::orchestrator::errors::StepResult;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::task::Task;
use crate::orchestrator::types::{Context, RunState};
use crate::tools::ToolCommand;

/// `gdal_pansharpen PAN MS OUTPUT OPTIONS...`, one run per source.
pub struct PansharpenStep;

impl PansharpenStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PansharpenStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for PansharpenStep {
    fn name(&self) -> &str {
        "Pansharpen"
    }

    fn description(&self) -> &str {
        "Pansharpened images"
    }

    fn is_enabled(&self, ctx: &Context) -> bool {
        ctx.config.pansharpening.is_some()
    }

    fn skip_reason(&self, ctx: &Context, _state: &RunState) -> Option<String> {
        if ctx.sources.iter().all(|s| s.has_multispectral()) {
            None
        } else {
            Some("multispectral products are not available for every source".to_string())
        }
    }

    fn validate_input(&self, _ctx: &Context, _state: &RunState) -> StepResult<()> {
        Ok(())
    }

    fn plan(&self, ctx: &Context, _state: &RunState) -> StepResult<Vec<Task>> {
        let options = ctx
            .config
            .pansharpening
            .as_ref()
            .map(|c| c.options.clone())
            .unwrap_or_default();

        Ok(ctx
            .sources
            .iter()
            .map(|source| {
                let output = ctx.layout.pansharpened(&source.id);
                let command = ToolCommand::new("gdal_pansharpen")
                    .path(&ctx.layout.map_projected_pan(&source.id))
                    .path(&ctx.layout.map_projected_ms(&source.id))
                    .path(&output)
                    .options(&options)
                    .output(&output);
                Task::invoke(source.id.clone(), command).with_fingerprint(output)
            })
            .collect())
    }
}
