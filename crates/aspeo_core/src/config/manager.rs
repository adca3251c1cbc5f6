//! Config manager for loading workflow files and writing presets.
//!
//! Key features:
//! - Parse + semantic validation in one place
//! - Atomic writes (write to temp file, then rename)
//! - Presets keep their comments through toml_edit

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::presets::Preset;
use super::settings::WorkflowConfig;

/// Errors that can occur during config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to parse config for editing: {0}")]
    EditParseError(#[from] toml_edit::TomlError),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Unknown preset '{name}' (available: {available})")]
    UnknownPreset { name: String, available: String },
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Manages one workflow file.
pub struct ConfigManager {
    /// Path to the workflow file.
    config_path: PathBuf,
    /// Configuration loaded in memory.
    config: WorkflowConfig,
}

impl ConfigManager {
    /// Create a manager for the given path.
    ///
    /// Does not load anything - call `load()` after.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            config: WorkflowConfig::default(),
        }
    }

    /// Get the workflow file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Changes stay in memory; workflow files are never rewritten.
    pub fn config_mut(&mut self) -> &mut WorkflowConfig {
        &mut self.config
    }

    pub fn into_config(self) -> WorkflowConfig {
        self.config
    }

    /// Load and validate the workflow file.
    ///
    /// Returns error if the file doesn't exist.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }

        let content = fs::read_to_string(&self.config_path)?;
        self.config = Self::parse(&content)?;
        tracing::debug!("Loaded workflow file {}", self.config_path.display());
        Ok(())
    }

    /// Parse and validate workflow content.
    pub fn parse(content: &str) -> ConfigResult<WorkflowConfig> {
        let config: WorkflowConfig = toml::from_str(content)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Write a preset to this manager's path, stamped with `version`.
    ///
    /// An existing file is replaced.
    pub fn write_preset(
        &self,
        preset: &Preset,
        version: &str,
        output: Option<&str>,
    ) -> ConfigResult<()> {
        let content = preset.render(version, output)?;
        self.atomic_write(&content)?;
        Ok(())
    }

    /// Write content to the workflow file atomically.
    ///
    /// Writes to a temp file first, then renames.
    fn atomic_write(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.config_path.with_extension("toml.tmp");

        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join("missing.toml"));
        assert!(matches!(manager.load(), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn load_reads_and_validates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("aspeo.toml");
        fs::write(&path, "output = \"run\"\n[dem-mosaic]\n").unwrap();

        let mut manager = ConfigManager::new(&path);
        manager.load().unwrap();
        assert_eq!(manager.config().output, PathBuf::from("run"));
        assert!(manager.config().dem_mosaic.is_some());

        fs::write(&path, "[point2dem]\no = \"x\"\n").unwrap();
        assert!(matches!(manager.load(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn typo_in_stage_name_fails_to_parse() {
        assert!(matches!(
            ConfigManager::parse("[pc_align]\n"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn write_preset_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("aspeo.toml");
        let manager = ConfigManager::new(&path);
        let preset = Preset::find("pixel-tracking").unwrap();

        manager.write_preset(preset, "0.1.0", None).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# ASPeo PARAMETER FILE (v0.1.0)"));
        assert!(!path.with_extension("toml.tmp").exists());

        let mut reloaded = ConfigManager::new(&path);
        reloaded.load().unwrap();
        assert!(reloaded.config().corr_eval.is_some());
    }
}
