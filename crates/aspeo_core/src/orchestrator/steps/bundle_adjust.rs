//! Bundle adjust step - refines the cameras before map projection.

use crate::config::BundleAdjustConfig;
use crate::models::{Source, SourceField};
use crate::orchestrator::errors::StepResult;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::task::Task;
use crate::orchestrator::types::{Context, RunState};
use crate::tools::ToolCommand;

use super::{require_field, source_path};

/// `bundle_adjust IMAGES... CAMERAS... -o BA/ba OPTIONS...`
///
/// One run per pair or triplet when a pairing file is configured, one run
/// over all sources otherwise. Always runs when configured.
pub struct BundleAdjustStep;

impl BundleAdjustStep {
    pub fn new() -> Self {
        Self
    }

    fn command(
        ctx: &Context,
        config: &BundleAdjustConfig,
        members: &[&Source],
        parallel: bool,
    ) -> StepResult<ToolCommand> {
        let program = if parallel {
            "parallel_bundle_adjust"
        } else {
            "bundle_adjust"
        };
        let prefix = ctx.layout.bundle_adjust_prefix();

        let mut command = ToolCommand::new(program);
        for source in members {
            command = command.path(source_path(source, SourceField::Pan)?);
        }
        for source in members {
            command = command.path(source_path(source, SourceField::Cam)?);
        }
        Ok(command
            .arg("-o")
            .path(&prefix)
            .options(&config.options)
            .output(prefix))
    }
}

impl Default for BundleAdjustStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for BundleAdjustStep {
    fn name(&self) -> &str {
        "BundleAdjust"
    }

    fn description(&self) -> &str {
        "Bundle adjustment"
    }

    fn is_enabled(&self, ctx: &Context) -> bool {
        ctx.config.bundle_adjust.is_some()
    }

    fn validate_input(&self, ctx: &Context, _state: &RunState) -> StepResult<()> {
        require_field(ctx, SourceField::Pan)?;
        require_field(ctx, SourceField::Cam)
    }

    fn plan(&self, ctx: &Context, _state: &RunState) -> StepResult<Vec<Task>> {
        let config = ctx.config.bundle_adjust.clone().unwrap_or_default();

        if ctx.config.pairs.is_some() {
            return ctx
                .pairs
                .iter()
                .map(|pair| -> StepResult<Task> {
                    let members = ctx.members(pair)?;
                    Ok(Task::invoke(pair.stem(), Self::command(ctx, &config, &members, false)?))
                })
                .collect();
        }

        let members: Vec<&Source> = ctx.sources.iter().collect();
        let parallel = members.len() > config.parallel_threshold;
        Ok(vec![Task::invoke(
            "all",
            Self::command(ctx, &config, &members, parallel)?,
        )])
    }

    fn record(&self, ctx: &Context, state: &mut RunState) -> StepResult<()> {
        state.bundle_adjust_prefix = Some(ctx.layout.bundle_adjust_prefix());
        Ok(())
    }
}
