//! ASPeo command-line interface.
//!
//! ```text
//! aspeo new [PRESET] [--path aspeo.toml] [--output DIR]
//! aspeo mp  <TOML> [--debug]
//! aspeo pt  <TOML> [--debug]
//! aspeo dsm <TOML> [--debug]
//! aspeo info <FOLDER_OR_DIM>
//! aspeo presets
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};

use aspeo_core::config::{ConfigManager, Preset, DEFAULT_PRESET};
use aspeo_core::logging::{init_tracing, init_tracing_with_file, LogConfig, LogLevel, RunLogger};
use aspeo_core::metadata::DimInfo;
use aspeo_core::orchestrator::{PipelineRunResult, Workflow};
use aspeo_core::tools::{CommandRunner, DryRunRunner, ProcessRunner};

/// Satellite stereo workflows on top of the Ames Stereo Pipeline.
#[derive(Debug, Parser)]
#[command(name = "aspeo", author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Recompute units of work whose output already exists.
    #[arg(long, global = true)]
    force: bool,

    /// trace, debug, info, warn or error.
    #[arg(long, global = true, default_value = "info")]
    log_level: LogLevel,

    /// Also write run logs and a daily rolling log to this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Write the JSON run report to this file.
    #[arg(long, global = true)]
    report: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a new workflow file from a preset.
    New {
        /// Preset name (see `aspeo presets`).
        preset: Option<String>,

        /// Destination file.
        #[arg(long, default_value = "aspeo.toml")]
        path: PathBuf,

        /// Value of `output` in the new file.
        #[arg(long)]
        output: Option<String>,
    },
    /// Map projection: bundle adjustment, orthorectification, pansharpening.
    Mp(RunArgs),
    /// Pixel tracking: alignment, correlation, correlation evaluation.
    Pt(RunArgs),
    /// DSM generation: point clouds, alignment, rasterization, mosaic.
    Dsm(RunArgs),
    /// Print the summary of a Pleiades DIM descriptor.
    Info {
        /// Product folder or DIM_*.XML file.
        path: PathBuf,
    },
    /// List the embedded presets.
    Presets,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Workflow file.
    toml: PathBuf,

    /// Print the commands without running anything.
    #[arg(short, long)]
    debug: bool,
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = match cli.log_dir {
        Some(ref dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            Some(init_tracing_with_file(cli.log_level, dir))
        }
        None => {
            init_tracing(cli.log_level);
            None
        }
    };

    match cli.command {
        Command::New {
            ref preset,
            ref path,
            ref output,
        } => new_workflow_file(
            preset.as_deref().unwrap_or(DEFAULT_PRESET),
            path,
            output.as_deref(),
        ),
        Command::Mp(ref args) => run(&cli, Workflow::MapProjection, args),
        Command::Pt(ref args) => run(&cli, Workflow::PixelTracking, args),
        Command::Dsm(ref args) => run(&cli, Workflow::Dsm, args),
        Command::Info { ref path } => {
            let info = DimInfo::open(path)
                .with_context(|| format!("reading DIM descriptor from {}", path.display()))?;
            println!("{}", info);
            Ok(())
        }
        Command::Presets => {
            for preset in Preset::all() {
                println!("{:<16} {}", preset.name, preset.description);
            }
            Ok(())
        }
    }
}

fn new_workflow_file(preset: &str, path: &Path, output: Option<&str>) -> Result<()> {
    let preset = Preset::find(preset)?;
    ConfigManager::new(path)
        .write_preset(preset, aspeo_core::version(), output)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {} preset to {}", preset.name, path.display());
    Ok(())
}

fn run(cli: &Cli, workflow: Workflow, args: &RunArgs) -> Result<()> {
    let mut manager = ConfigManager::new(&args.toml);
    manager
        .load()
        .with_context(|| format!("loading {}", args.toml.display()))?;
    let mut config = manager.into_config();
    if cli.force {
        config.force = true;
    }

    let logger = RunLogger::new(
        workflow.name(),
        cli.log_dir.as_deref(),
        LogConfig {
            level: cli.log_level,
            ..LogConfig::default()
        },
        None,
    )
    .context("creating run logger")?;

    let runner: Arc<dyn CommandRunner> = if args.debug {
        Arc::new(DryRunRunner::new())
    } else {
        Arc::new(ProcessRunner::new())
    };

    let result = workflow.run(config, runner, Arc::new(logger))?;
    tracing::info!(
        "{}: {} step(s) completed, {} task(s) run, {} skipped",
        workflow,
        result.steps_completed.len(),
        result.tasks_executed,
        result.tasks_skipped
    );

    if let Some(ref path) = cli.report {
        write_report(&result, path)?;
    }
    Ok(())
}

fn write_report(result: &PipelineRunResult, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    fs::write(path, json).with_context(|| format!("writing report {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "aspeo",
            "dsm",
            "run.toml",
            "--debug",
            "--force",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert!(cli.force);
        assert_eq!(cli.log_level, LogLevel::Debug);
        match cli.command {
            Command::Dsm(args) => {
                assert_eq!(args.toml, PathBuf::from("run.toml"));
                assert!(args.debug);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        assert!(Cli::try_parse_from(["aspeo", "presets", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn new_writes_a_loadable_preset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        new_workflow_file("dsm", &path, Some("results")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# ASPeo PARAMETER FILE (v"));

        let mut manager = ConfigManager::new(&path);
        manager.load().unwrap();
        assert_eq!(manager.config().output, PathBuf::from("results"));
    }

    #[test]
    fn new_rejects_unknown_preset() {
        let dir = tempdir().unwrap();
        let err = new_workflow_file("nope", &dir.path().join("x.toml"), None).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn report_is_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        let result = PipelineRunResult {
            workflow: "dsm".to_string(),
            ..Default::default()
        };
        write_report(&result, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["workflow"], "dsm");
    }
}
