//! The three workflows and their stage order.
//!
//! ```text
//! map-projection   DemRetrieval → BundleAdjust → MapProjectPan → MapProjectMs
//!                  → Pansharpen → Orbitviz
//! pixel-tracking   Align → Stereo (correlation) → CorrEval
//! dsm              DemRetrieval → Stereo (point clouds) → PcAlign → Point2Dem
//!                  → DemMosaic
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::errors::{PipelineError, PipelineResult};
use super::pipeline::{Pipeline, PipelineRunResult};
use super::steps::{
    AlignStep, BundleAdjustStep, CorrEvalStep, DemMosaicStep, DemRetrievalStep, MapProjectStep,
    OrbitvizStep, PansharpenStep, PcAlignStep, Point2DemStep, StereoStep,
};
use super::types::{Context, RunState};
use crate::config::{Stage, WorkflowConfig};
use crate::layout::OutputLayout;
use crate::logging::RunLogger;
use crate::models::{Pair, Source, SourceField};
use crate::resolve::{
    ids_from_pairs, resolve_pairs, resolve_sources, source_ids, ResolveError, ResolveResult,
};
use crate::tools::CommandRunner;

/// Pixel tracking reads only the first two columns of source and pair lines.
pub const PIXEL_TRACKING_COLUMNS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    MapProjection,
    PixelTracking,
    Dsm,
}

impl Workflow {
    pub fn name(&self) -> &'static str {
        match self {
            Workflow::MapProjection => "map-projection",
            Workflow::PixelTracking => "pixel-tracking",
            Workflow::Dsm => "dsm",
        }
    }

    /// Stages of this workflow, in dependency order.
    pub fn pipeline(&self) -> Pipeline {
        match self {
            Workflow::MapProjection => Pipeline::new()
                .with_step(DemRetrievalStep::for_stages([Stage::MapProject]))
                .with_step(BundleAdjustStep::new())
                .with_step(MapProjectStep::panchromatic())
                .with_step(MapProjectStep::multispectral())
                .with_step(PansharpenStep::new())
                .with_step(OrbitvizStep::new()),
            Workflow::PixelTracking => Pipeline::new()
                .with_step(AlignStep::new())
                .with_step(StereoStep::pixel_tracking())
                .with_step(CorrEvalStep::new()),
            Workflow::Dsm => Pipeline::new()
                .with_step(DemRetrievalStep::for_stages([Stage::Stereo, Stage::PcAlign]))
                .with_step(StereoStep::dsm())
                .with_step(PcAlignStep::new())
                .with_step(Point2DemStep::new())
                .with_step(DemMosaicStep::new()),
        }
    }

    /// Column truncation applied to source and pair lines.
    fn first_columns(&self) -> Option<usize> {
        match self {
            Workflow::PixelTracking => Some(PIXEL_TRACKING_COLUMNS),
            _ => None,
        }
    }

    /// Resolve the sources and pairs this workflow works from.
    ///
    /// Map projection only reads pairs when a pairing file is configured;
    /// the other workflows synthesize every 2-combination without one.
    pub fn resolve(&self, config: &WorkflowConfig) -> ResolveResult<(Vec<Source>, Vec<Pair>)> {
        let first = self.first_columns();
        let sources = resolve_sources(config, first)?;
        let ids = source_ids(&sources);

        let pairs = match self {
            Workflow::MapProjection if config.pairs.is_none() => Vec::new(),
            _ => resolve_pairs(config, &ids, first)?,
        };

        let needs_projected = match self {
            Workflow::PixelTracking => true,
            Workflow::Dsm => config.stereo.is_some(),
            Workflow::MapProjection => false,
        };
        if !needs_projected {
            return Ok((sources, pairs));
        }

        // Alignment registers every source; correlation only reads pair members.
        let required = if config.align.is_some() {
            ids
        } else {
            ids_from_pairs(&pairs)
        };
        let layout = OutputLayout::new(config.output.clone());
        let sources = locate_map_projected(sources, &layout, &required)?;
        Ok((sources, pairs))
    }

    /// Resolve inputs and run every configured stage.
    pub fn run(
        &self,
        config: WorkflowConfig,
        runner: Arc<dyn CommandRunner>,
        logger: Arc<RunLogger>,
    ) -> PipelineResult<PipelineRunResult> {
        logger.info(&format!("Beginning {} sequence", self.name()));

        config
            .validate()
            .map_err(|e| PipelineError::validation_failed(self.name(), e))?;
        let (sources, pairs) = self
            .resolve(&config)
            .map_err(|e| PipelineError::resolution_failed(self.name(), e))?;
        logger.debug(&format!(
            "{} source(s), {} pair(s)",
            sources.len(),
            pairs.len()
        ));

        let mut state = RunState::new(self.name(), &config);
        let ctx = Context::new(self.name(), config, sources, pairs, runner, logger);
        self.pipeline().run(&ctx, &mut state)
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Give every source in `required` an existing map-projected image.
///
/// Uses the source's own `mp` when that file exists, otherwise the output
/// of a previous map-projection run. A required source without one is
/// fatal; other sources are passed through unchanged.
pub fn locate_map_projected(
    sources: Vec<Source>,
    layout: &OutputLayout,
    required: &[String],
) -> ResolveResult<Vec<Source>> {
    sources
        .into_iter()
        .map(|source| {
            if source.mp.as_deref().is_some_and(Path::is_file) {
                return Ok(source);
            }
            let previous = layout.map_projected_pan(&source.id);
            if previous.is_file() {
                tracing::debug!("Using {} for source '{}'", previous.display(), source.id);
                return Ok(source.to_builder().field(SourceField::Mp, previous).build());
            }
            if !required.contains(&source.id) {
                return Ok(source);
            }

            let mut looked_for = Vec::new();
            if let Some(ref mp) = source.mp {
                looked_for.push(mp.display().to_string());
            }
            looked_for.push(previous.display().to_string());
            Err(ResolveError::MapProjectedMissing {
                id: source.id,
                looked_for: looked_for.join(", "),
            })
        })
        .collect()
}

pub fn run_map_projection(
    config: WorkflowConfig,
    runner: Arc<dyn CommandRunner>,
    logger: Arc<RunLogger>,
) -> PipelineResult<PipelineRunResult> {
    Workflow::MapProjection.run(config, runner, logger)
}

pub fn run_pixel_tracking(
    config: WorkflowConfig,
    runner: Arc<dyn CommandRunner>,
    logger: Arc<RunLogger>,
) -> PipelineResult<PipelineRunResult> {
    Workflow::PixelTracking.run(config, runner, logger)
}

pub fn run_dsm(
    config: WorkflowConfig,
    runner: Arc<dyn CommandRunner>,
    logger: Arc<RunLogger>,
) -> PipelineResult<PipelineRunResult> {
    Workflow::Dsm.run(config, runner, logger)
}
