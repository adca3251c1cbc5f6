//! Idempotent units of work.
//!
//! A stage plans a list of [`Task`]s. Each task may carry a fingerprint:
//! the artifact whose presence means the task already ran. The executor
//! drops fingerprinted tasks whose artifact exists (unless forced) and runs
//! the rest in order.

use std::fs;
use std::path::{Path, PathBuf};

use super::errors::{StepError, StepResult};
use super::types::Context;
use crate::tools::ToolCommand;

/// What a task does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    /// Run an external tool.
    Invoke(ToolCommand),
    /// Copy a file.
    Copy { from: PathBuf, to: PathBuf },
    /// Write a bundled file.
    Write { path: PathBuf, contents: String },
}

/// One unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Short label for logs (pair stem, source id).
    pub label: String,
    pub action: TaskAction,
    /// Artifact proving the task already ran.
    pub fingerprint: Option<PathBuf>,
}

impl Task {
    pub fn invoke(label: impl Into<String>, command: ToolCommand) -> Self {
        Self {
            label: label.into(),
            action: TaskAction::Invoke(command),
            fingerprint: None,
        }
    }

    pub fn copy(label: impl Into<String>, from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            action: TaskAction::Copy {
                from: from.into(),
                to: to.into(),
            },
            fingerprint: None,
        }
    }

    pub fn write(
        label: impl Into<String>,
        path: impl Into<PathBuf>,
        contents: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            action: TaskAction::Write {
                path: path.into(),
                contents: contents.into(),
            },
            fingerprint: None,
        }
    }

    /// Skip the task when `path` exists.
    pub fn with_fingerprint(mut self, path: impl Into<PathBuf>) -> Self {
        self.fingerprint = Some(path.into());
        self
    }

    /// Files the task creates.
    pub fn outputs(&self) -> Vec<&Path> {
        match self.action {
            TaskAction::Invoke(ref command) => command.outputs().iter().map(PathBuf::as_path).collect(),
            TaskAction::Copy { ref to, .. } => vec![to.as_path()],
            TaskAction::Write { ref path, .. } => vec![path.as_path()],
        }
    }

    /// The external command, if this task runs one.
    pub fn command(&self) -> Option<&ToolCommand> {
        match self.action {
            TaskAction::Invoke(ref command) => Some(command),
            _ => None,
        }
    }

    /// Whether the task's artifact is already present.
    pub fn is_done(&self) -> bool {
        self.fingerprint.as_deref().is_some_and(Path::exists)
    }
}

/// Counts from one call to [`execute_tasks`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSummary {
    pub executed: usize,
    pub skipped: usize,
}

/// Run `tasks` in order, dropping those already done unless `ctx.force`.
///
/// The first failure aborts the remaining tasks.
pub fn execute_tasks(ctx: &Context, tasks: &[Task]) -> StepResult<TaskSummary> {
    let mut summary = TaskSummary::default();

    for task in tasks {
        if !ctx.force && task.is_done() {
            if let Some(ref fingerprint) = task.fingerprint {
                ctx.logger
                    .skip(&format!("{}: {} exists", task.label, fingerprint.display()));
            }
            summary.skipped += 1;
            continue;
        }

        let dry_run = ctx.is_dry_run();
        if !dry_run {
            create_parent_dirs(&task.outputs())?;
        }

        match task.action {
            TaskAction::Invoke(ref command) => {
                ctx.logger.command(&command.to_string());
                ctx.runner.run(command)?;
            }
            TaskAction::Copy { ref from, ref to } => {
                ctx.logger
                    .command(&format!("cp {} {}", from.display(), to.display()));
                if !dry_run {
                    fs::copy(from, to).map_err(|e| {
                        StepError::io_error(format!("copying {}", from.display()), e)
                    })?;
                }
            }
            TaskAction::Write { ref path, ref contents } => {
                ctx.logger.debug(&format!("Writing {}", path.display()));
                if !dry_run {
                    fs::write(path, contents).map_err(|e| {
                        StepError::io_error(format!("writing {}", path.display()), e)
                    })?;
                }
            }
        }
        summary.executed += 1;
    }

    Ok(summary)
}

fn create_parent_dirs(outputs: &[&Path]) -> StepResult<()> {
    for output in outputs {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                StepError::io_error(format!("creating {}", parent.display()), e)
            })?;
        }
    }
    Ok(())
}
