//! Workflow configuration.
//!
//! This module provides:
//! - Typed, validated records for the workflow TOML file
//! - Loading through [`ConfigManager`]
//! - Embedded presets written by `aspeo new`
//!
//! # Example
//!
//! ```no_run
//! use aspeo_core::config::ConfigManager;
//!
//! let mut manager = ConfigManager::new("aspeo.toml");
//! manager.load().unwrap();
//!
//! if let Some(stereo) = &manager.config().stereo {
//!     println!("stereo options: {:?}", stereo.options.to_args());
//! }
//! ```

mod manager;
mod presets;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use presets::{Preset, DEFAULT_PRESET};
pub use settings::{
    BundleAdjustConfig, DemRetrievalConfig, MapProjectConfig, SourceRecord, SourceSpec, Stage,
    StageConfig, WorkflowConfig,
};
