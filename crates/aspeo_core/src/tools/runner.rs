//! Execution modes for external tool invocations.
//!
//! - [`ProcessRunner`] spawns the program, inheriting stdout/stderr, and
//!   blocks until it exits.
//! - [`DryRunRunner`] prints the command line and spawns nothing.
//! - [`RecordingRunner`] records every command and can create the declared
//!   outputs, standing in for the external binaries.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use parking_lot::Mutex;
use thiserror::Error;

use super::command::ToolCommand;

/// Errors from running an external tool.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} failed with exit code {exit_code}")]
    Failed { program: String, exit_code: i32 },

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Runs external tool invocations.
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion. Non-zero exit status is an error.
    fn run(&self, command: &ToolCommand) -> ToolResult<()>;

    /// Check whether a helper answers: true when it exits with status 0.
    fn probe(&self, command: &ToolCommand) -> bool;

    /// Print-only mode: nothing is spawned, copied or written.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Spawns processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &ToolCommand) -> ToolResult<()> {
        let status = Command::new(command.program())
            .args(command.arg_list())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| ToolError::Spawn {
                program: command.program().to_string(),
                source: e,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ToolError::Failed {
                program: command.program().to_string(),
                exit_code: status.code().unwrap_or(-1),
            })
        }
    }

    fn probe(&self, command: &ToolCommand) -> bool {
        match Command::new(command.program())
            .args(command.arg_list())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::debug!("probe of {} failed: {}", command.program(), e);
                false
            }
        }
    }
}

/// Prints commands instead of running them.
///
/// Probes still run for real: a missing helper is reported even in dry-run.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunRunner;

impl DryRunRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for DryRunRunner {
    fn run(&self, command: &ToolCommand) -> ToolResult<()> {
        println!("{}", command);
        Ok(())
    }

    fn probe(&self, command: &ToolCommand) -> bool {
        ProcessRunner.probe(command)
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}

/// Records commands; optionally creates their declared outputs.
#[derive(Debug)]
pub struct RecordingRunner {
    commands: Mutex<Vec<ToolCommand>>,
    touch_outputs: bool,
    probe_ok: bool,
    failing_program: Option<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            touch_outputs: false,
            probe_ok: true,
            failing_program: None,
        }
    }

    /// Create every declared output as an empty file after each run.
    pub fn touching_outputs(mut self) -> Self {
        self.touch_outputs = true;
        self
    }

    /// Answer probes with `ok`.
    pub fn with_probe(mut self, ok: bool) -> Self {
        self.probe_ok = ok;
        self
    }

    /// Fail every invocation of `program` with exit code 1.
    pub fn failing_on(mut self, program: impl Into<String>) -> Self {
        self.failing_program = Some(program.into());
        self
    }

    /// Commands received so far.
    pub fn commands(&self) -> Vec<ToolCommand> {
        self.commands.lock().clone()
    }

    /// Number of recorded invocations of `program`.
    pub fn count(&self, program: &str) -> usize {
        self.commands
            .lock()
            .iter()
            .filter(|c| c.program() == program)
            .count()
    }

    /// Number of recorded invocations.
    pub fn len(&self) -> usize {
        self.commands.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.lock().is_empty()
    }

    pub fn clear(&self) {
        self.commands.lock().clear();
    }
}

impl Default for RecordingRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, command: &ToolCommand) -> ToolResult<()> {
        self.commands.lock().push(command.clone());

        if self.failing_program.as_deref() == Some(command.program()) {
            return Err(ToolError::Failed {
                program: command.program().to_string(),
                exit_code: 1,
            });
        }

        if self.touch_outputs {
            for output in command.outputs() {
                if let Some(parent) = output.parent() {
                    fs::create_dir_all(parent).map_err(|e| ToolError::Io {
                        path: parent.to_path_buf(),
                        source: e,
                    })?;
                }
                fs::write(output, b"").map_err(|e| ToolError::Io {
                    path: output.clone(),
                    source: e,
                })?;
            }
        }
        Ok(())
    }

    fn probe(&self, _command: &ToolCommand) -> bool {
        self.probe_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn recording_runner_touches_outputs() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("STEREO").join("a_b").join("stereo-F.tif");
        let runner = RecordingRunner::new().touching_outputs();

        runner
            .run(&ToolCommand::new("parallel_stereo").output(&output))
            .unwrap();

        assert!(output.exists());
        assert_eq!(runner.count("parallel_stereo"), 1);
    }

    #[test]
    fn recording_runner_can_fail() {
        let runner = RecordingRunner::new().failing_on("pc_align");
        let err = runner.run(&ToolCommand::new("pc_align")).unwrap_err();
        assert!(err.to_string().contains("exit code 1"));
        assert_eq!(runner.len(), 1);
    }

    #[test]
    fn process_runner_reports_missing_program() {
        let cmd = ToolCommand::new("aspeo-no-such-program-xyz");
        assert!(matches!(
            ProcessRunner.run(&cmd),
            Err(ToolError::Spawn { .. })
        ));
        assert!(!ProcessRunner.probe(&cmd));
    }

    #[test]
    fn dry_run_spawns_nothing() {
        let runner = DryRunRunner::new();
        assert!(runner.is_dry_run());
        assert!(runner.run(&ToolCommand::new("aspeo-no-such-program-xyz")).is_ok());
    }
}
