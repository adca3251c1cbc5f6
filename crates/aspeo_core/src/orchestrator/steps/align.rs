//! Image alignment step - registers every map-projected image onto the
//! first source's.

use std::collections::BTreeMap;

use crate::models::SourceField;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::task::Task;
use crate::orchestrator::types::{Context, RunState};
use crate::tools::ToolCommand;

use super::{require_field, source_path};

/// Copies the reference to `MP/ALIGNED/`, then
/// `image_align OPTIONS... REFERENCE SOURCE -o OUTPUT` for the others.
pub struct AlignStep;

impl AlignStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AlignStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for AlignStep {
    fn name(&self) -> &str {
        "Align"
    }

    fn description(&self) -> &str {
        "Image alignment"
    }

    fn is_enabled(&self, ctx: &Context) -> bool {
        ctx.config.align.is_some()
    }

    fn validate_input(&self, ctx: &Context, _state: &RunState) -> StepResult<()> {
        if ctx.sources.is_empty() {
            return Err(StepError::invalid_input("no source to align"));
        }
        require_field(ctx, SourceField::Mp)
    }

    fn plan(&self, ctx: &Context, _state: &RunState) -> StepResult<Vec<Task>> {
        let Some((reference, others)) = ctx.sources.split_first() else {
            return Ok(Vec::new());
        };
        let reference_image = source_path(reference, SourceField::Mp)?;
        let options = ctx
            .config
            .align
            .as_ref()
            .map(|c| c.options.clone())
            .unwrap_or_default();

        let aligned_reference = ctx.layout.aligned(&reference.id);
        let mut tasks = vec![Task::copy(
            reference.id.clone(),
            reference_image,
            &aligned_reference,
        )
        .with_fingerprint(aligned_reference.clone())];

        for source in others {
            let image = source_path(source, SourceField::Mp)?;
            let output = ctx.layout.aligned(&source.id);
            let command = ToolCommand::new("image_align")
                .options(&options)
                .path(reference_image)
                .path(image)
                .arg("-o")
                .path(&output)
                .output(&output);
            tasks.push(Task::invoke(source.id.clone(), command).with_fingerprint(output));
        }
        Ok(tasks)
    }

    fn record(&self, ctx: &Context, state: &mut RunState) -> StepResult<()> {
        let mut aligned = BTreeMap::new();
        for source in &ctx.sources {
            aligned.insert(source.id.clone(), ctx.layout.aligned(&source.id));
        }
        state.aligned = Some(aligned);
        Ok(())
    }
}
