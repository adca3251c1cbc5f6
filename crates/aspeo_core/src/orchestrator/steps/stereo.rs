//! Stereo correlation step.
//!
//! `parallel_stereo OPTIONS... IMAGES... CAMERAS... OUTPUT_PREFIX [DEM]`
//! once per pair or triplet, in pair order.
//!
//! Pixel tracking stops after correlation (`stop-point = 5`) and falls back
//! to the bundled identity cameras for sources without one. DSM generation
//! runs the full pipeline against the reference DEM.

use std::path::{Path, PathBuf};

use toml::Value;

use crate::assets::{BLACK_LEFT_TSAI, BLACK_RIGHT_TSAI};
use crate::models::SourceField;
use crate::orchestrator::errors::StepResult;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::task::Task;
use crate::orchestrator::types::{Context, RunState};
use crate::tools::{ToolCommand, ToolOptions};

use super::require_field;

/// Last stereo stage run for pixel tracking (correlation and filtering).
pub const PIXEL_TRACKING_STOP_POINT: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StereoMode {
    PixelTracking,
    Dsm,
}

pub struct StereoStep {
    mode: StereoMode,
}

impl StereoStep {
    /// Correlation only; fingerprint `<fragment>-F.tif`.
    pub fn pixel_tracking() -> Self {
        Self {
            mode: StereoMode::PixelTracking,
        }
    }

    /// Full point cloud against the DEM; fingerprint `<fragment>-pc.tif`.
    pub fn dsm() -> Self {
        Self {
            mode: StereoMode::Dsm,
        }
    }

    fn options(&self, ctx: &Context) -> ToolOptions {
        let options = ctx
            .config
            .stereo
            .as_ref()
            .map(|c| c.options.clone())
            .unwrap_or_default();
        match self.mode {
            StereoMode::PixelTracking => {
                options.with("stop-point", Value::Integer(PIXEL_TRACKING_STOP_POINT))
            }
            StereoMode::Dsm => options.without("stop-point"),
        }
    }

    /// Camera of the `index`-th member, or the bundled identity camera.
    fn camera(&self, ctx: &Context, camera: Option<&Path>, index: usize) -> PathBuf {
        match camera {
            Some(path) => path.to_path_buf(),
            None if index == 0 => ctx.layout.black_camera_left(),
            None => ctx.layout.black_camera_right(),
        }
    }

    fn needs_black_cameras(&self, ctx: &Context) -> bool {
        self.mode == StereoMode::PixelTracking
            && ctx.pairs.iter().any(|pair| {
                pair.ids()
                    .iter()
                    .any(|id| ctx.source(id).map(|s| s.cam.is_none()).unwrap_or(false))
            })
    }
}

impl PipelineStep for StereoStep {
    fn name(&self) -> &str {
        "Stereo"
    }

    fn description(&self) -> &str {
        match self.mode {
            StereoMode::PixelTracking => "Stereo correlation",
            StereoMode::Dsm => "Stereo point clouds",
        }
    }

    fn is_enabled(&self, ctx: &Context) -> bool {
        ctx.config.stereo.is_some()
    }

    fn validate_input(&self, ctx: &Context, state: &RunState) -> StepResult<()> {
        for pair in &ctx.pairs {
            for source in ctx.members(pair)? {
                state.correlation_image(source)?;
            }
        }
        if self.mode == StereoMode::Dsm {
            state.require_dem()?;
            require_field(ctx, SourceField::Cam)?;
        }
        Ok(())
    }

    fn plan(&self, ctx: &Context, state: &RunState) -> StepResult<Vec<Task>> {
        let options = self.options(ctx);
        let mut tasks = Vec::new();

        if self.needs_black_cameras(ctx) {
            let left = ctx.layout.black_camera_left();
            let right = ctx.layout.black_camera_right();
            tasks.push(Task::write("black_left", &left, BLACK_LEFT_TSAI).with_fingerprint(left));
            tasks.push(Task::write("black_right", &right, BLACK_RIGHT_TSAI).with_fingerprint(right));
        }

        for pair in &ctx.pairs {
            let members = ctx.members(pair)?;
            let fragment = ctx.layout.fragment(pair);
            ctx.logger.debug(&format!("Stereo pair: {}", pair));

            let mut command = ToolCommand::new("parallel_stereo").options(&options);
            for source in &members {
                command = command.path(state.correlation_image(source)?);
            }
            for (index, source) in members.iter().enumerate() {
                command = command.path(&self.camera(ctx, source.cam.as_deref(), index));
            }
            command = command.path(fragment.prefix());

            let fingerprint = match self.mode {
                StereoMode::PixelTracking => {
                    command = command
                        .output(fragment.left())
                        .output(fragment.right())
                        .output(fragment.disparity());
                    fragment.disparity()
                }
                StereoMode::Dsm => {
                    command = command.path(state.require_dem()?).output(fragment.point_cloud());
                    fragment.point_cloud()
                }
            };
            tasks.push(Task::invoke(pair.stem(), command).with_fingerprint(fingerprint));
        }
        Ok(tasks)
    }
}
