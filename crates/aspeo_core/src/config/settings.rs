//! Workflow configuration records.
//!
//! The workflow file is one TOML document. Global settings live at the top
//! level; every stage has its own table. A stage runs if and only if its
//! table is present:
//!
//! ```toml
//! output = "run"
//! pairs = "pairs.txt"
//! dem = "ref_dem.tif"
//! mp-suffix = ".tif"
//!
//! [map-project]
//! tr-pan = 0.5
//! t = "rpc"
//!
//! [stereo]
//! alignment-method = "none"
//! ```
//!
//! Unknown top-level keys are rejected at load time, so a misspelled stage
//! name is an error instead of a silently skipped stage.

use std::path::PathBuf;

use serde::Deserialize;
use toml::Value;

use crate::models::SourceField;
use crate::tools::ToolOptions;

/// Root workflow configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct WorkflowConfig {
    /// Root output directory.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Source definition: inline records or a description file.
    #[serde(default)]
    pub source: Option<SourceSpec>,

    /// Pairing file.
    #[serde(default)]
    pub pairs: Option<PathBuf>,

    /// Skip the first line of the pairing file.
    #[serde(default)]
    pub pairs_header: bool,

    /// First line of the source file names its columns.
    #[serde(default)]
    pub source_header: bool,

    /// Folder prepended to every templated source path.
    #[serde(default)]
    pub source_folder: Option<PathBuf>,

    /// Derive `pan` from the id instead of `mp`.
    #[serde(default)]
    pub derive_pan: bool,

    /// Reference elevation model. Retrieved automatically when absent.
    #[serde(default)]
    pub dem: Option<PathBuf>,

    /// Recompute units of work whose output already exists.
    #[serde(default)]
    pub force: bool,

    #[serde(default)]
    pub pan_prefix: Option<String>,
    #[serde(default)]
    pub pan_suffix: Option<String>,
    #[serde(default)]
    pub ms_prefix: Option<String>,
    #[serde(default)]
    pub ms_suffix: Option<String>,
    #[serde(default)]
    pub cam_prefix: Option<String>,
    #[serde(default)]
    pub cam_suffix: Option<String>,
    #[serde(default)]
    pub mp_prefix: Option<String>,
    #[serde(default)]
    pub mp_suffix: Option<String>,
    #[serde(default)]
    pub cam_ms_prefix: Option<String>,
    #[serde(default)]
    pub cam_ms_suffix: Option<String>,
    #[serde(default)]
    pub pleiades_prefix: Option<String>,
    #[serde(default)]
    pub pleiades_suffix: Option<String>,

    #[serde(default)]
    pub bundle_adjust: Option<BundleAdjustConfig>,
    #[serde(default)]
    pub map_project: Option<MapProjectConfig>,
    #[serde(default)]
    pub pansharpening: Option<StageConfig>,
    #[serde(default)]
    pub orbitviz: Option<StageConfig>,
    #[serde(default)]
    pub align: Option<StageConfig>,
    #[serde(default)]
    pub stereo: Option<StageConfig>,
    #[serde(default)]
    pub corr_eval: Option<StageConfig>,
    #[serde(default)]
    pub pc_align: Option<StageConfig>,
    #[serde(default)]
    pub point2dem: Option<StageConfig>,
    #[serde(default)]
    pub dem_mosaic: Option<StageConfig>,
    #[serde(default)]
    pub dem_retrieval: Option<DemRetrievalConfig>,
}

fn default_output() -> PathBuf {
    PathBuf::from(".")
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            source: None,
            pairs: None,
            pairs_header: false,
            source_header: false,
            source_folder: None,
            derive_pan: false,
            dem: None,
            force: false,
            pan_prefix: None,
            pan_suffix: None,
            ms_prefix: None,
            ms_suffix: None,
            cam_prefix: None,
            cam_suffix: None,
            mp_prefix: None,
            mp_suffix: None,
            cam_ms_prefix: None,
            cam_ms_suffix: None,
            pleiades_prefix: None,
            pleiades_suffix: None,
            bundle_adjust: None,
            map_project: None,
            pansharpening: None,
            orbitviz: None,
            align: None,
            stereo: None,
            corr_eval: None,
            pc_align: None,
            point2dem: None,
            dem_mosaic: None,
            dem_retrieval: None,
        }
    }
}

impl WorkflowConfig {
    /// Templating prefix and suffix configured for a field.
    pub fn affixes(&self, field: SourceField) -> (Option<&str>, Option<&str>) {
        let (prefix, suffix) = match field {
            SourceField::Pan => (&self.pan_prefix, &self.pan_suffix),
            SourceField::Ms => (&self.ms_prefix, &self.ms_suffix),
            SourceField::Cam => (&self.cam_prefix, &self.cam_suffix),
            SourceField::Mp => (&self.mp_prefix, &self.mp_suffix),
            SourceField::CamMs => (&self.cam_ms_prefix, &self.cam_ms_suffix),
            SourceField::Pleiades => (&self.pleiades_prefix, &self.pleiades_suffix),
        };
        (prefix.as_deref(), suffix.as_deref())
    }

    /// Names and tool options of every configured stage, in file-independent order.
    pub fn stage_options(&self) -> Vec<(Stage, &ToolOptions)> {
        let mut stages = Vec::new();
        if let Some(ref c) = self.bundle_adjust {
            stages.push((Stage::BundleAdjust, &c.options));
        }
        if let Some(ref c) = self.map_project {
            stages.push((Stage::MapProject, &c.options));
        }
        let generic = [
            (Stage::Pansharpening, &self.pansharpening),
            (Stage::Orbitviz, &self.orbitviz),
            (Stage::Align, &self.align),
            (Stage::Stereo, &self.stereo),
            (Stage::CorrEval, &self.corr_eval),
            (Stage::PcAlign, &self.pc_align),
            (Stage::Point2Dem, &self.point2dem),
            (Stage::DemMosaic, &self.dem_mosaic),
        ];
        for (stage, config) in generic {
            if let Some(c) = config {
                stages.push((stage, &c.options));
            }
        }
        if let Some(ref c) = self.dem_retrieval {
            stages.push((Stage::DemRetrieval, &c.options));
        }
        stages
    }

    /// Whether a stage table is present.
    pub fn has_stage(&self, stage: Stage) -> bool {
        self.stage_options().iter().any(|(s, _)| *s == stage)
    }

    /// Semantic checks that serde cannot express.
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        for (stage, options) in self.stage_options() {
            options
                .validate()
                .map_err(|e| format!("[{}]: {}", stage.table_name(), e))?;
            for key in stage.reserved_options() {
                if options.contains(key) {
                    return Err(format!(
                        "[{}]: option '{}' is set by the workflow and cannot be configured",
                        stage.table_name(),
                        key
                    ));
                }
            }
        }

        if let Some(ref ba) = self.bundle_adjust {
            if ba.parallel_threshold == 0 {
                return Err("[bundle-adjust]: parallel-threshold must be at least 1".to_string());
            }
        }

        if let Some(ref mp) = self.map_project {
            for (key, value) in [("tr-pan", &mp.tr_pan), ("tr-ms", &mp.tr_ms)] {
                if matches!(value, Some(Value::Table(_)) | Some(Value::Array(_))) {
                    return Err(format!("[map-project]: {} must be a number", key));
                }
            }
            if (mp.tr_pan.is_some() || mp.tr_ms.is_some()) && mp.options.contains("tr") {
                return Err("[map-project]: use tr-pan / tr-ms instead of tr".to_string());
            }
        }

        if let Some(ref dem) = self.dem_retrieval {
            if dem.command.trim().is_empty() {
                return Err("[dem-retrieval]: command must not be empty".to_string());
            }
        }

        if let Some(SourceSpec::Inline(ref records)) = self.source {
            if records.is_empty() {
                return Err("source list is empty".to_string());
            }
            if let Some(record) = records.iter().find(|r| r.id.trim().is_empty()) {
                return Err(format!("source record with empty id: {:?}", record));
            }
        }

        Ok(())
    }
}

/// Stage section names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    BundleAdjust,
    MapProject,
    Pansharpening,
    Orbitviz,
    Align,
    Stereo,
    CorrEval,
    PcAlign,
    Point2Dem,
    DemMosaic,
    DemRetrieval,
}

impl Stage {
    /// TOML table name for this stage.
    pub fn table_name(&self) -> &'static str {
        match self {
            Stage::BundleAdjust => "bundle-adjust",
            Stage::MapProject => "map-project",
            Stage::Pansharpening => "pansharpening",
            Stage::Orbitviz => "orbitviz",
            Stage::Align => "align",
            Stage::Stereo => "stereo",
            Stage::CorrEval => "corr-eval",
            Stage::PcAlign => "pc-align",
            Stage::Point2Dem => "point2dem",
            Stage::DemMosaic => "dem-mosaic",
            Stage::DemRetrieval => "dem-retrieval",
        }
    }

    /// Options the workflow passes itself.
    pub fn reserved_options(&self) -> &'static [&'static str] {
        match self {
            Stage::BundleAdjust
            | Stage::Orbitviz
            | Stage::Align
            | Stage::PcAlign
            | Stage::Point2Dem
            | Stage::DemMosaic => &["o"],
            Stage::MapProject => &["bundle-adjust-prefix"],
            Stage::DemRetrieval => &["o", "bbox"],
            Stage::Pansharpening | Stage::Stereo | Stage::CorrEval => &[],
        }
    }
}

/// `source` is either a path to a description file or a list of records.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SourceSpec {
    File(PathBuf),
    Inline(Vec<SourceRecord>),
}

/// One inline `[[source]]` record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SourceRecord {
    pub id: String,
    #[serde(default)]
    pub pan: Option<String>,
    #[serde(default)]
    pub ms: Option<String>,
    #[serde(default)]
    pub cam: Option<String>,
    #[serde(default)]
    pub mp: Option<String>,
    #[serde(default)]
    pub cam_ms: Option<String>,
    #[serde(default)]
    pub pleiades: Option<String>,
    /// DIM descriptor given directly instead of through `pleiades`.
    #[serde(default)]
    pub dim: Option<String>,
}

impl SourceRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Value of a field as written in the configuration.
    pub fn get(&self, field: SourceField) -> Option<&str> {
        let value = match field {
            SourceField::Pan => &self.pan,
            SourceField::Ms => &self.ms,
            SourceField::Cam => &self.cam,
            SourceField::Mp => &self.mp,
            SourceField::CamMs => &self.cam_ms,
            SourceField::Pleiades => &self.pleiades,
        };
        value.as_deref()
    }

    /// Set a field (builder pattern).
    pub fn with(mut self, field: SourceField, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match field {
            SourceField::Pan => self.pan = value,
            SourceField::Ms => self.ms = value,
            SourceField::Cam => self.cam = value,
            SourceField::Mp => self.mp = value,
            SourceField::CamMs => self.cam_ms = value,
            SourceField::Pleiades => self.pleiades = value,
        }
        self
    }
}

/// A stage with tool options only.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StageConfig {
    #[serde(flatten)]
    pub options: ToolOptions,
}

/// `[bundle-adjust]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BundleAdjustConfig {
    /// Use `parallel_bundle_adjust` above this many images.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,

    #[serde(flatten)]
    pub options: ToolOptions,
}

fn default_parallel_threshold() -> usize {
    3
}

impl Default for BundleAdjustConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: default_parallel_threshold(),
            options: ToolOptions::default(),
        }
    }
}

/// `[map-project]`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MapProjectConfig {
    /// Output resolution (`--tr`) of the panchromatic run.
    #[serde(default)]
    pub tr_pan: Option<Value>,

    /// Output resolution (`--tr`) of the multispectral run.
    #[serde(default)]
    pub tr_ms: Option<Value>,

    #[serde(flatten)]
    pub options: ToolOptions,
}

/// `[dem-retrieval]`
///
/// Optional: the helper is used with defaults when the table is absent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DemRetrievalConfig {
    /// Helper program fetching elevation tiles for a bounding box.
    #[serde(default = "default_dem_command")]
    pub command: String,

    #[serde(flatten)]
    pub options: ToolOptions,
}

fn default_dem_command() -> String {
    "my_getDemFile.py".to_string()
}

impl Default for DemRetrievalConfig {
    fn default() -> Self {
        Self {
            command: default_dem_command(),
            options: ToolOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: WorkflowConfig = toml::from_str("").unwrap();
        assert_eq!(config.output, PathBuf::from("."));
        assert!(config.source.is_none());
        assert!(!config.force);
        assert!(config.stage_options().is_empty());
    }

    #[test]
    fn stage_presence_enables_stage() {
        let config: WorkflowConfig = toml::from_str("[stereo]\n[dem-mosaic]\n").unwrap();
        assert!(config.has_stage(Stage::Stereo));
        assert!(config.has_stage(Stage::DemMosaic));
        assert!(!config.has_stage(Stage::PcAlign));
        assert!(config.stereo.unwrap().options.is_empty());
    }

    #[test]
    fn misspelled_stage_is_rejected() {
        let result: Result<WorkflowConfig, _> = toml::from_str("[streo]\n");
        assert!(result.is_err());
    }

    #[test]
    fn named_fields_are_not_tool_options() {
        let config: WorkflowConfig = toml::from_str(
            r#"
            [bundle-adjust]
            parallel-threshold = 5
            num-iterations = 50

            [map-project]
            tr-pan = 0.5
            t = "rpc"
            "#,
        )
        .unwrap();

        let ba = config.bundle_adjust.unwrap();
        assert_eq!(ba.parallel_threshold, 5);
        assert!(!ba.options.contains("parallel-threshold"));
        assert!(ba.options.contains("num-iterations"));

        let mp = config.map_project.unwrap();
        assert_eq!(mp.tr_pan, Some(Value::Float(0.5)));
        assert!(mp.tr_ms.is_none());
        assert_eq!(mp.options.to_args(), vec!["-t", "rpc"]);
    }

    #[test]
    fn source_accepts_file_or_records() {
        let file: WorkflowConfig = toml::from_str("source = \"sources.txt\"\n").unwrap();
        assert!(matches!(file.source, Some(SourceSpec::File(_))));

        let inline: WorkflowConfig = toml::from_str(
            r#"
            [[source]]
            id = "a"
            pan = "pan_a.tif"
            cam-ms = "cam_ms_a.xml"
            "#,
        )
        .unwrap();
        match inline.source {
            Some(SourceSpec::Inline(records)) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].get(SourceField::CamMs), Some("cam_ms_a.xml"));
            }
            other => panic!("expected inline records, got {:?}", other),
        }
    }

    #[test]
    fn affixes_follow_field_keys() {
        let config: WorkflowConfig =
            toml::from_str("cam-ms-prefix = \"RPC_\"\nmp-suffix = \".tif\"\n").unwrap();
        assert_eq!(config.affixes(SourceField::CamMs), (Some("RPC_"), None));
        assert_eq!(config.affixes(SourceField::Mp), (None, Some(".tif")));
    }

    #[test]
    fn validate_rejects_reserved_and_nested_options() {
        let reserved: WorkflowConfig = toml::from_str("[point2dem]\no = \"x\"\n").unwrap();
        let err = reserved.validate().unwrap_err();
        assert!(err.contains("[point2dem]"));

        let nested: WorkflowConfig = toml::from_str("[stereo]\nk = [[1], [2]]\n").unwrap();
        assert!(nested.validate().is_err());

        let zero: WorkflowConfig =
            toml::from_str("[bundle-adjust]\nparallel-threshold = 0\n").unwrap();
        assert!(zero.validate().is_err());

        let ok: WorkflowConfig =
            toml::from_str("[map-project]\ntr-pan = 0.5\nt = \"rpc\"\n").unwrap();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn dem_retrieval_defaults_to_helper() {
        assert_eq!(DemRetrievalConfig::default().command, "my_getDemFile.py");
    }
}
