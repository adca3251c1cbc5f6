//! Per-run logger with optional file and callback output.
//!
//! Each workflow run gets its own logger that:
//! - Writes to a dedicated log file (when a log directory is given)
//! - Sends formatted lines to a callback (if provided)
//! - Mirrors every line to `tracing`

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

/// Per-run logger.
pub struct RunLogger {
    /// Run name for identification.
    run_name: String,
    /// Path to log file, if any.
    log_path: Option<PathBuf>,
    /// File writer (buffered).
    file_writer: Arc<Mutex<Option<BufWriter<File>>>>,
    /// Callback sink.
    callback: Arc<Mutex<Option<LogCallback>>>,
    /// Logging configuration.
    config: LogConfig,
}

impl RunLogger {
    /// Create a run logger.
    ///
    /// # Arguments
    /// * `run_name` - Name of the run (used in the log filename)
    /// * `log_dir` - Directory to write the log file to, or `None` for no file
    /// * `config` - Logging configuration
    /// * `callback` - Optional sink for formatted lines
    pub fn new(
        run_name: impl Into<String>,
        log_dir: Option<&Path>,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> std::io::Result<Self> {
        let run_name = run_name.into();

        let (log_path, writer) = match log_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                let path = dir.join(format!("{}.log", sanitize_filename(&run_name)));
                let file = File::create(&path)?;
                (Some(path), Some(BufWriter::new(file)))
            }
            None => (None, None),
        };

        Ok(Self {
            run_name,
            log_path,
            file_writer: Arc::new(Mutex::new(writer)),
            callback: Arc::new(Mutex::new(callback)),
            config,
        })
    }

    /// Logger that only mirrors to `tracing`.
    pub fn console(run_name: impl Into<String>) -> Self {
        Self {
            run_name: run_name.into(),
            log_path: None,
            file_writer: Arc::new(Mutex::new(None)),
            callback: Arc::new(Mutex::new(None)),
            config: LogConfig {
                show_timestamps: false,
                ..LogConfig::default()
            },
        }
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Log a message at the specified level.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }

        if self.config.mirror_to_tracing {
            match level {
                LogLevel::Trace => tracing::trace!(run = %self.run_name, "{}", message),
                LogLevel::Debug => tracing::debug!(run = %self.run_name, "{}", message),
                LogLevel::Info => tracing::info!(run = %self.run_name, "{}", message),
                LogLevel::Warn => tracing::warn!(run = %self.run_name, "{}", message),
                LogLevel::Error => tracing::error!(run = %self.run_name, "{}", message),
            }
        }

        let formatted = self.format_message(message);
        self.output(&formatted);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        let msg = MessagePrefix::Warning.format(message);
        self.log(LogLevel::Warn, &msg);
    }

    pub fn error(&self, message: &str) {
        let msg = MessagePrefix::Error.format(message);
        self.log(LogLevel::Error, &msg);
    }

    /// Log a command line.
    pub fn command(&self, command: &str) {
        let msg = MessagePrefix::Command.format(command);
        self.log(LogLevel::Info, &msg);
    }

    /// Log a phase marker.
    pub fn phase(&self, phase_name: &str) {
        let msg = MessagePrefix::Phase.format(phase_name);
        self.log(LogLevel::Info, &msg);
    }

    /// Log a skipped unit of work.
    pub fn skip(&self, message: &str) {
        let msg = MessagePrefix::Skip.format(message);
        self.log(LogLevel::Info, &msg);
    }

    pub fn success(&self, message: &str) {
        let msg = MessagePrefix::Success.format(message);
        self.log(LogLevel::Info, &msg);
    }

    /// Flush the log file.
    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writer.flush();
        }
    }

    /// Close the logger and release the file.
    pub fn close(&self) {
        self.flush();
        *self.file_writer.lock() = None;
    }

    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            let timestamp = Local::now().format("%H:%M:%S");
            format!("[{}] {}", timestamp, message)
        } else {
            message.to_string()
        }
    }

    fn output(&self, formatted: &str) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writeln!(writer, "{}", formatted);
        }

        if let Some(ref callback) = *self.callback.lock() {
            callback(formatted);
        }
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Sanitize a string to be safe for use as a filename.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' => '_',
            _ => c,
        })
        .collect()
}

/// Builder for [`RunLogger`].
pub struct RunLoggerBuilder {
    run_name: String,
    log_dir: Option<PathBuf>,
    config: LogConfig,
    callback: Option<LogCallback>,
}

impl RunLoggerBuilder {
    pub fn new(run_name: impl Into<String>) -> Self {
        Self {
            run_name: run_name.into(),
            log_dir: None,
            config: LogConfig::default(),
            callback: None,
        }
    }

    /// Write a log file into `dir`.
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    pub fn callback(mut self, callback: LogCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn build(self) -> std::io::Result<RunLogger> {
        RunLogger::new(
            self.run_name,
            self.log_dir.as_deref(),
            self.config,
            self.callback,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_to_file() {
        let dir = tempdir().unwrap();
        let logger = RunLoggerBuilder::new("dsm run")
            .log_dir(dir.path())
            .config(LogConfig::quiet())
            .build()
            .unwrap();

        logger.phase("Stereo");
        logger.skip("a_b: output exists");
        logger.flush();

        let path = logger.log_path().unwrap().to_path_buf();
        assert!(path.ends_with("dsm_run.log"));
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("=== Stereo ==="));
        assert!(content.contains("[SKIP] a_b: output exists"));
    }

    #[test]
    fn callback_receives_lines_above_level() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();

        let logger = RunLoggerBuilder::new("pt")
            .config(LogConfig::quiet())
            .callback(Box::new(move |msg| sink.lock().push(msg.to_string())))
            .build()
            .unwrap();

        logger.debug("hidden");
        logger.command("parallel_stereo a.tif b.tif");
        logger.warn("careful");

        let lines = lines.lock();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "$ parallel_stereo a.tif b.tif");
        assert_eq!(lines[1], "[WARNING] careful");
    }

    #[test]
    fn sanitizes_filename() {
        assert_eq!(sanitize_filename("normal_name"), "normal_name");
        assert_eq!(sanitize_filename("has/slash"), "has_slash");
        assert_eq!(sanitize_filename("a<b>c"), "a_b_c");
    }
}
