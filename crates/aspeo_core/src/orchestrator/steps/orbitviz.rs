//! Orbit visualization step.

use crate::models::SourceField;
use crate::orchestrator::errors::StepResult;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::task::Task;
use crate::orchestrator::types::{Context, RunState};
use crate::tools::ToolCommand;

use super::{require_field, source_path};

/// `orbitviz OPTIONS... IMAGES... CAMERAS... -o orbits.kml`
pub struct OrbitvizStep;

impl OrbitvizStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OrbitvizStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for OrbitvizStep {
    fn name(&self) -> &str {
        "Orbitviz"
    }

    fn description(&self) -> &str {
        "Orbit view (KML)"
    }

    fn is_enabled(&self, ctx: &Context) -> bool {
        ctx.config.orbitviz.is_some()
    }

    fn validate_input(&self, ctx: &Context, _state: &RunState) -> StepResult<()> {
        require_field(ctx, SourceField::Pan)?;
        require_field(ctx, SourceField::Cam)
    }

    fn plan(&self, ctx: &Context, _state: &RunState) -> StepResult<Vec<Task>> {
        let kml = ctx.layout.orbits_kml();
        let mut command = ToolCommand::new("orbitviz");
        if let Some(ref config) = ctx.config.orbitviz {
            command = command.options(&config.options);
        }
        for source in &ctx.sources {
            command = command.path(source_path(source, SourceField::Pan)?);
        }
        for source in &ctx.sources {
            command = command.path(source_path(source, SourceField::Cam)?);
        }
        let command = command.arg("-o").path(&kml).output(&kml);

        Ok(vec![Task::invoke("orbits", command).with_fingerprint(kml)])
    }
}
