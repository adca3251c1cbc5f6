//! Map projection step - orthorectifies each source onto the reference DEM.

use std::path::PathBuf;

use crate::models::SourceField;
use crate::orchestrator::errors::StepResult;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::task::Task;
use crate::orchestrator::types::{Context, RunState};
use crate::tools::{ToolCommand, ToolOptions};

use super::{require_field, source_path};

/// Which product of each source is projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// `pan` with `cam` into `MP/PAN/mp-pan<id>.tif`.
    Panchromatic,
    /// `ms` with `cam-ms` into `MP/MS/mp-ms<id>.tif`.
    Multispectral,
}

impl Band {
    fn fields(&self) -> (SourceField, SourceField) {
        match self {
            Band::Panchromatic => (SourceField::Pan, SourceField::Cam),
            Band::Multispectral => (SourceField::Ms, SourceField::CamMs),
        }
    }
}

/// `mapproject OPTIONS... DEM IMAGE CAMERA OUTPUT`, one run per source.
pub struct MapProjectStep {
    band: Band,
}

impl MapProjectStep {
    pub fn panchromatic() -> Self {
        Self {
            band: Band::Panchromatic,
        }
    }

    pub fn multispectral() -> Self {
        Self {
            band: Band::Multispectral,
        }
    }

    /// Prefix of this run's or a previous run's bundle adjustment.
    fn bundle_adjust_prefix(ctx: &Context, state: &RunState) -> Option<PathBuf> {
        state
            .bundle_adjust_prefix
            .clone()
            .or_else(|| ctx.layout.existing_bundle_adjust_prefix())
    }

    /// Stage options with the resolution and bundle adjustment injected.
    fn options(&self, ctx: &Context, state: &RunState) -> ToolOptions {
        let Some(ref config) = ctx.config.map_project else {
            return ToolOptions::new();
        };
        let mut options = config.options.clone();

        let tr = match self.band {
            Band::Panchromatic => config.tr_pan.as_ref(),
            Band::Multispectral => config.tr_ms.as_ref(),
        };
        if let Some(tr) = tr {
            options.insert("tr", tr.clone());
        }
        if let Some(prefix) = Self::bundle_adjust_prefix(ctx, state) {
            options.insert("bundle-adjust-prefix", prefix.display().to_string());
        }
        options
    }

    fn output(&self, ctx: &Context, id: &str) -> PathBuf {
        match self.band {
            Band::Panchromatic => ctx.layout.map_projected_pan(id),
            Band::Multispectral => ctx.layout.map_projected_ms(id),
        }
    }
}

impl PipelineStep for MapProjectStep {
    fn name(&self) -> &str {
        match self.band {
            Band::Panchromatic => "MapProjectPan",
            Band::Multispectral => "MapProjectMs",
        }
    }

    fn description(&self) -> &str {
        match self.band {
            Band::Panchromatic => "Map project panchromatic (P) images",
            Band::Multispectral => "Map project multispectral (MS) images",
        }
    }

    fn is_enabled(&self, ctx: &Context) -> bool {
        ctx.config.map_project.is_some()
    }

    fn skip_reason(&self, ctx: &Context, _state: &RunState) -> Option<String> {
        if self.band == Band::Multispectral && !ctx.sources.iter().all(|s| s.has_multispectral()) {
            return Some("not every source has ms and cam-ms".to_string());
        }
        None
    }

    fn validate_input(&self, ctx: &Context, state: &RunState) -> StepResult<()> {
        state.require_dem()?;
        if self.skip_reason(ctx, state).is_some() {
            return Ok(());
        }
        let (image, camera) = self.band.fields();
        require_field(ctx, image)?;
        require_field(ctx, camera)
    }

    fn plan(&self, ctx: &Context, state: &RunState) -> StepResult<Vec<Task>> {
        let dem = state.require_dem()?;
        let options = self.options(ctx, state);
        let (image, camera) = self.band.fields();

        ctx.sources
            .iter()
            .map(|source| -> StepResult<Task> {
                let output = self.output(ctx, &source.id);
                let command = ToolCommand::new("mapproject")
                    .options(&options)
                    .path(dem)
                    .path(source_path(source, image)?)
                    .path(source_path(source, camera)?)
                    .path(&output)
                    .output(&output);
                Ok(Task::invoke(source.id.clone(), command).with_fingerprint(output))
            })
            .collect()
    }

    fn record(&self, ctx: &Context, state: &mut RunState) -> StepResult<()> {
        if state.bundle_adjust_prefix.is_none() {
            state.bundle_adjust_prefix = ctx.layout.existing_bundle_adjust_prefix();
        }
        Ok(())
    }
}
