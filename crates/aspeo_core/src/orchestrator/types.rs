//! Core types for the orchestrator pipeline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use super::errors::{StepError, StepResult};
use crate::config::WorkflowConfig;
use crate::layout::OutputLayout;
use crate::logging::RunLogger;
use crate::models::{Pair, Source};
use crate::resolve::source_by_id;
use crate::tools::CommandRunner;

/// Read-only context passed to pipeline steps.
///
/// Holds the validated configuration and the resolved sources and pairs.
/// Everything a step derives for later steps goes in `RunState`.
pub struct Context {
    /// Workflow name (`map-projection`, `pixel-tracking`, `dsm`).
    pub workflow_name: String,
    /// Validated workflow configuration.
    pub config: WorkflowConfig,
    /// Output path namer.
    pub layout: OutputLayout,
    /// Resolved sources, in declaration order.
    pub sources: Vec<Source>,
    /// Resolved pairs and triplets, in processing order.
    pub pairs: Vec<Pair>,
    /// Recompute units of work whose fingerprint exists.
    pub force: bool,
    /// Execution mode for external tools.
    pub runner: Arc<dyn CommandRunner>,
    /// Per-run logger.
    pub logger: Arc<RunLogger>,
}

impl Context {
    /// Create a new context for a workflow run.
    pub fn new(
        workflow_name: impl Into<String>,
        config: WorkflowConfig,
        sources: Vec<Source>,
        pairs: Vec<Pair>,
        runner: Arc<dyn CommandRunner>,
        logger: Arc<RunLogger>,
    ) -> Self {
        Self {
            workflow_name: workflow_name.into(),
            layout: OutputLayout::new(config.output.clone()),
            force: config.force,
            config,
            sources,
            pairs,
            runner,
            logger,
        }
    }

    /// Look up a source by id.
    pub fn source(&self, id: &str) -> StepResult<&Source> {
        Ok(source_by_id(&self.sources, id)?)
    }

    /// Members of `pair`, in order.
    pub fn members(&self, pair: &Pair) -> StepResult<Vec<&Source>> {
        pair.ids().iter().map(|id| self.source(id)).collect()
    }

    /// Print-only mode.
    pub fn is_dry_run(&self) -> bool {
        self.runner.is_dry_run()
    }
}

/// State accumulated while a workflow runs.
///
/// Write-once: a step fills its own fields and later steps only read them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunState {
    /// Workflow name.
    pub workflow: String,
    /// When the run started.
    pub started_at: Option<String>,
    /// Reference elevation model, configured or retrieved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dem: Option<PathBuf>,
    /// Bundle adjustment prefix handed to map projection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_adjust_prefix: Option<PathBuf>,
    /// Aligned image per source id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aligned: Option<BTreeMap<String, PathBuf>>,
    /// Units of work run.
    pub tasks_executed: usize,
    /// Units of work skipped because their fingerprint existed.
    pub tasks_skipped: usize,
}

impl RunState {
    /// Create the state of a new run of `workflow`.
    pub fn new(workflow: impl Into<String>, config: &WorkflowConfig) -> Self {
        Self {
            workflow: workflow.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            dem: config.dem.clone(),
            ..Default::default()
        }
    }

    /// The reference elevation model, required by the calling step.
    pub fn require_dem(&self) -> StepResult<&Path> {
        self.dem.as_deref().ok_or_else(|| {
            StepError::precondition_failed("no reference DEM configured or retrieved")
        })
    }

    /// Image a source contributes to correlation: aligned if alignment ran,
    /// its map-projected image otherwise.
    pub fn correlation_image<'a>(&'a self, source: &'a Source) -> StepResult<&'a Path> {
        if let Some(path) = self.aligned.as_ref().and_then(|a| a.get(&source.id)) {
            return Ok(path);
        }
        source.mp.as_deref().ok_or_else(|| {
            StepError::invalid_input(format!("source '{}' has no map projected image", source.id))
        })
    }
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (not applicable, but not an error).
    Skipped(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceField;

    #[test]
    fn correlation_image_prefers_aligned() {
        let source = Source::builder("a")
            .field(SourceField::Mp, "MP/PAN/mp-pana.tif")
            .build();
        let mut state = RunState::new("pixel-tracking", &WorkflowConfig::default());
        assert_eq!(
            state.correlation_image(&source).unwrap(),
            Path::new("MP/PAN/mp-pana.tif")
        );

        state.aligned = Some(BTreeMap::from([(
            "a".to_string(),
            PathBuf::from("MP/ALIGNED/align-mp-pana.tif"),
        )]));
        assert_eq!(
            state.correlation_image(&source).unwrap(),
            Path::new("MP/ALIGNED/align-mp-pana.tif")
        );
    }

    #[test]
    fn dem_comes_from_config() {
        let config = WorkflowConfig {
            dem: Some(PathBuf::from("srtm.tif")),
            ..Default::default()
        };
        let state = RunState::new("dsm", &config);
        assert_eq!(state.require_dem().unwrap(), Path::new("srtm.tif"));
        assert!(RunState::new("dsm", &WorkflowConfig::default())
            .require_dem()
            .is_err());
    }

    #[test]
    fn run_state_serializes() {
        let state = RunState::new("map-projection", &WorkflowConfig::default());
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"workflow\":\"map-projection\""));
        assert!(!json.contains("bundle_adjust_prefix"));
    }
}
