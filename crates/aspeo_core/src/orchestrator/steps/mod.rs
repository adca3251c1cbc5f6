//! Pipeline step implementations, one per stage.

mod align;
mod bundle_adjust;
mod corr_eval;
mod dem_mosaic;
mod dem_retrieval;
mod map_project;
mod orbitviz;
mod pansharpen;
mod pc_align;
mod point2dem;
mod stereo;

pub use align::AlignStep;
pub use bundle_adjust::BundleAdjustStep;
pub use corr_eval::CorrEvalStep;
pub use dem_mosaic::DemMosaicStep;
pub use dem_retrieval::DemRetrievalStep;
pub use map_project::{Band, MapProjectStep};
pub use orbitviz::OrbitvizStep;
pub use pansharpen::PansharpenStep;
pub use pc_align::PcAlignStep;
pub use point2dem::Point2DemStep;
pub use stereo::{StereoStep, PIXEL_TRACKING_STOP_POINT};

use std::path::Path;

use super::errors::{StepError, StepResult};
use super::types::Context;
use crate::models::{Source, SourceField};

/// Every source must define `field`.
pub(crate) fn require_field(ctx: &Context, field: SourceField) -> StepResult<()> {
    match ctx.sources.iter().find(|s| s.get(field).is_none()) {
        Some(source) => Err(StepError::invalid_input(format!(
            "source '{}' has no {}",
            source.id, field
        ))),
        None => Ok(()),
    }
}

/// `field` of `source`, required.
pub(crate) fn source_path(source: &Source, field: SourceField) -> StepResult<&Path> {
    source
        .get(field)
        .ok_or_else(|| StepError::invalid_input(format!("source '{}' has no {}", source.id, field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkflowConfig;
    use crate::logging::RunLogger;
    use crate::models::Pair;
    use crate::orchestrator::step::PipelineStep;
    use crate::orchestrator::task::Task;
    use crate::orchestrator::types::RunState;
    use crate::tools::RecordingRunner;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn context(config: &str, sources: Vec<Source>, pairs: Vec<Pair>) -> Context {
        let config: WorkflowConfig = toml::from_str(config).unwrap();
        config.validate().unwrap();
        Context::new(
            "test",
            config,
            sources,
            pairs,
            Arc::new(RecordingRunner::new()),
            Arc::new(RunLogger::console("test")),
        )
    }

    fn raw(id: &str) -> Source {
        Source::builder(id)
            .field(SourceField::Pan, format!("{}.tif", id))
            .field(SourceField::Cam, format!("{}.xml", id))
            .build()
    }

    fn projected(id: &str) -> Source {
        Source::builder(id)
            .field(SourceField::Mp, format!("mp-{}.tif", id))
            .build()
    }

    fn command_lines(tasks: &[Task]) -> Vec<String> {
        tasks
            .iter()
            .filter_map(|t| t.command().map(ToString::to_string))
            .collect()
    }

    #[test]
    fn bundle_adjust_over_all_sources() {
        let ctx = context(
            "output = \"out\"\n[bundle-adjust]\nparallel-threshold = 2\nnum-iterations = 50\n",
            vec![raw("a"), raw("b"), raw("c")],
            Vec::new(),
        );
        let state = RunState::new("test", &ctx.config);
        let tasks = BundleAdjustStep::new().plan(&ctx, &state).unwrap();

        assert_eq!(
            command_lines(&tasks),
            vec![
                "parallel_bundle_adjust a.tif b.tif c.tif a.xml b.xml c.xml -o out/BA/ba --num-iterations 50"
            ]
        );
        assert!(tasks[0].fingerprint.is_none());
    }

    #[test]
    fn bundle_adjust_per_pair_with_pairs_file() {
        let ctx = context(
            "output = \"out\"\npairs = \"pairs.txt\"\n[bundle-adjust]\nparallel-threshold = 1\n",
            vec![raw("a"), raw("b"), raw("c")],
            vec![Pair::stereo("a", "b"), Pair::triplet("a", "b", "c")],
        );
        let state = RunState::new("test", &ctx.config);
        let tasks = BundleAdjustStep::new().plan(&ctx, &state).unwrap();

        assert_eq!(
            command_lines(&tasks),
            vec![
                "bundle_adjust a.tif b.tif a.xml b.xml -o out/BA/ba",
                "bundle_adjust a.tif b.tif c.tif a.xml b.xml c.xml -o out/BA/ba",
            ]
        );
    }

    #[test]
    fn map_project_injects_resolution_and_prefix() {
        let ctx = context(
            "output = \"out\"\ndem = \"srtm.tif\"\n[map-project]\ntr-pan = 0.5\nt = \"rpc\"\n",
            vec![raw("a")],
            Vec::new(),
        );
        let mut state = RunState::new("test", &ctx.config);
        state.bundle_adjust_prefix = Some(ctx.layout.bundle_adjust_prefix());

        let tasks = MapProjectStep::panchromatic().plan(&ctx, &state).unwrap();
        assert_eq!(
            command_lines(&tasks),
            vec![
                "mapproject -t rpc --tr 0.5 --bundle-adjust-prefix out/BA/ba srtm.tif a.tif a.xml out/MP/PAN/mp-pana.tif"
            ]
        );
        assert_eq!(
            tasks[0].fingerprint.as_deref(),
            Some(Path::new("out/MP/PAN/mp-pana.tif"))
        );
    }

    #[test]
    fn multispectral_needs_every_source() {
        let with_ms = raw("a")
            .to_builder()
            .field(SourceField::Ms, "a_ms.tif")
            .field(SourceField::CamMs, "a_ms.xml")
            .build();
        let ctx = context(
            "dem = \"srtm.tif\"\n[map-project]\n",
            vec![with_ms, raw("b")],
            Vec::new(),
        );
        let state = RunState::new("test", &ctx.config);

        assert!(MapProjectStep::multispectral()
            .skip_reason(&ctx, &state)
            .is_some());
        assert!(MapProjectStep::panchromatic()
            .skip_reason(&ctx, &state)
            .is_none());
    }

    #[test]
    fn pixel_tracking_stereo_forces_stop_point_and_black_cameras() {
        let ctx = context(
            "output = \"out\"\n[stereo]\nalignment-method = \"none\"\n",
            vec![projected("a"), projected("b")],
            vec![Pair::stereo("a", "b")],
        );
        let state = RunState::new("test", &ctx.config);
        let tasks = StereoStep::pixel_tracking().plan(&ctx, &state).unwrap();

        assert_eq!(tasks.len(), 3);
        assert_eq!(
            command_lines(&tasks),
            vec![
                "parallel_stereo --alignment-method none --stop-point 5 mp-a.tif mp-b.tif out/STEREO/black_left.tsai out/STEREO/black_right.tsai out/STEREO/a_b/stereo"
            ]
        );
        assert_eq!(
            tasks[2].fingerprint.as_deref(),
            Some(Path::new("out/STEREO/a_b/stereo-F.tif"))
        );
    }

    #[test]
    fn dsm_stereo_drops_stop_point_and_appends_dem() {
        let source = |id: &str| {
            projected(id)
                .to_builder()
                .field(SourceField::Cam, format!("{}.xml", id))
                .build()
        };
        let ctx = context(
            "output = \"out\"\ndem = \"ref.tif\"\n[stereo]\nstop-point = 5\n",
            vec![source("a"), source("b"), source("c")],
            vec![Pair::triplet("a", "b", "c")],
        );
        let state = RunState::new("test", &ctx.config);
        let tasks = StereoStep::dsm().plan(&ctx, &state).unwrap();

        assert_eq!(
            command_lines(&tasks),
            vec![
                "parallel_stereo mp-a.tif mp-b.tif mp-c.tif a.xml b.xml c.xml out/STEREO/a_b_c/stereo ref.tif"
            ]
        );
        assert_eq!(
            tasks[0].fingerprint.as_deref(),
            Some(Path::new("out/STEREO/a_b_c/stereo-pc.tif"))
        );
    }

    #[test]
    fn dsm_chain_commands() {
        let ctx = context(
            "output = \"out\"\ndem = \"ref.tif\"\n[pc-align]\nmax-displacement = 10\n[point2dem]\n[dem-mosaic]\n",
            vec![projected("a"), projected("b"), projected("c")],
            vec![Pair::stereo("a", "b"), Pair::stereo("b", "c")],
        );
        let state = RunState::new("test", &ctx.config);

        assert_eq!(
            command_lines(&PcAlignStep::new().plan(&ctx, &state).unwrap()),
            vec![
                "pc_align --max-displacement 10 ref.tif out/STEREO/a_b/stereo-pc.tif -o out/STEREO/a_b/stereo-pc_aligned.tif",
                "pc_align --max-displacement 10 ref.tif out/STEREO/b_c/stereo-pc.tif -o out/STEREO/b_c/stereo-pc_aligned.tif",
            ]
        );
        assert_eq!(
            command_lines(&Point2DemStep::new().plan(&ctx, &state).unwrap())[0],
            "point2dem out/STEREO/a_b/stereo-pc_aligned.tif -o out/STEREO/a_b/stereo-dem.tif"
        );
        assert_eq!(
            command_lines(&DemMosaicStep::new().plan(&ctx, &state).unwrap()),
            vec![
                "dem_mosaic out/STEREO/a_b/stereo-dem.tif out/STEREO/b_c/stereo-dem.tif -o out/dem.tif"
            ]
        );
    }

    #[test]
    fn corr_eval_reads_stereo_products() {
        let ctx = context(
            "output = \"out\"\n[corr-eval]\nkernel-size = [5, 5]\n",
            vec![projected("a"), projected("b")],
            vec![Pair::stereo("a", "b")],
        );
        let state = RunState::new("test", &ctx.config);
        let tasks = CorrEvalStep::new().plan(&ctx, &state).unwrap();

        assert_eq!(
            command_lines(&tasks),
            vec![
                "corr_eval --kernel-size 5 5 out/STEREO/a_b/stereo-L.tif out/STEREO/a_b/stereo-R.tif out/STEREO/a_b/stereo-F.tif out/STEREO/a_b/stereo"
            ]
        );
        assert_eq!(
            tasks[0].fingerprint.as_deref(),
            Some(Path::new("out/STEREO/a_b/stereo-ncc.tif"))
        );
    }

    #[test]
    fn align_copies_reference_and_aligns_others() {
        let ctx = context(
            "output = \"out\"\n[align]\nalignment-transform = \"rigid\"\n",
            vec![projected("a"), projected("b")],
            Vec::new(),
        );
        let mut state = RunState::new("test", &ctx.config);
        let tasks = AlignStep::new().plan(&ctx, &state).unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].outputs(), vec![Path::new("out/MP/ALIGNED/align-a.tif")]);
        assert_eq!(
            command_lines(&tasks),
            vec![
                "image_align --alignment-transform rigid mp-a.tif mp-b.tif -o out/MP/ALIGNED/align-b.tif"
            ]
        );

        AlignStep::new().record(&ctx, &mut state).unwrap();
        let b = ctx.source("b").unwrap();
        assert_eq!(
            state.correlation_image(b).unwrap(),
            Path::new("out/MP/ALIGNED/align-b.tif")
        );
    }

    #[test]
    fn align_outputs_do_not_collide_on_shared_file_names() {
        let image = |id: &str, folder: &str| {
            Source::builder(id)
                .field(SourceField::Mp, format!("{}/img.tif", folder))
                .build()
        };
        let ctx = context(
            "output = \"out\"\n[align]\n",
            vec![image("a", "x"), image("b", "y")],
            Vec::new(),
        );
        let tasks = AlignStep::new()
            .plan(&ctx, &RunState::new("test", &ctx.config))
            .unwrap();

        assert_eq!(tasks[0].outputs(), vec![Path::new("out/MP/ALIGNED/align-a.tif")]);
        assert_eq!(tasks[1].outputs(), vec![Path::new("out/MP/ALIGNED/align-b.tif")]);
    }

    #[test]
    fn orbitviz_and_pansharpen_commands() {
        let ctx = context(
            "output = \"out\"\n[orbitviz]\nt = \"rpc\"\n[pansharpening]\n",
            vec![raw("a")],
            Vec::new(),
        );
        let state = RunState::new("test", &ctx.config);

        assert_eq!(
            command_lines(&OrbitvizStep::new().plan(&ctx, &state).unwrap()),
            vec!["orbitviz -t rpc a.tif a.xml -o out/orbits.kml"]
        );
        assert_eq!(
            command_lines(&PansharpenStep::new().plan(&ctx, &state).unwrap()),
            vec!["gdal_pansharpen out/MP/PAN/mp-pana.tif out/MP/MS/mp-msa.tif out/MP/PANSHARP/pansharpa.tif"]
        );
    }

    #[test]
    fn missing_camera_is_reported() {
        let ctx = context("[orbitviz]\n", vec![projected("a")], Vec::new());
        let state = RunState::new("test", &ctx.config);
        let err = OrbitvizStep::new().validate_input(&ctx, &state).unwrap_err();
        assert_eq!(err.to_string(), "Input validation failed: source 'a' has no pan");
    }
}
