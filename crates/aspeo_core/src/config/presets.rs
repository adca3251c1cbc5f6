//! Workflow file presets embedded in the binary.

use toml_edit::DocumentMut;

use super::manager::{ConfigError, ConfigResult};

/// Preset used when none is named.
pub const DEFAULT_PRESET: &str = "default";

/// A named workflow file template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    content: &'static str,
}

const PRESETS: &[Preset] = &[
    Preset {
        name: "default",
        description: "Every stage with commented global settings",
        content: include_str!("../../presets/default.toml"),
    },
    Preset {
        name: "map-projection",
        description: "Orthorectification of raw Pleiades products",
        content: include_str!("../../presets/map-projection.toml"),
    },
    Preset {
        name: "pixel-tracking",
        description: "Offset tracking between map-projected images",
        content: include_str!("../../presets/pixel-tracking.toml"),
    },
    Preset {
        name: "dsm",
        description: "Surface model from stereo pairs and triplets",
        content: include_str!("../../presets/dsm.toml"),
    },
];

impl Preset {
    /// Look up a preset by name.
    pub fn find(name: &str) -> ConfigResult<&'static Preset> {
        PRESETS
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ConfigError::UnknownPreset {
                name: name.to_string(),
                available: Self::names().join(", "),
            })
    }

    /// All embedded presets.
    pub fn all() -> &'static [Preset] {
        PRESETS
    }

    pub fn names() -> Vec<&'static str> {
        PRESETS.iter().map(|p| p.name).collect()
    }

    /// Raw template text.
    pub fn content(&self) -> &'static str {
        self.content
    }

    /// Render the preset with a version header, optionally overriding `output`.
    ///
    /// Comments and key order of the template are kept.
    pub fn render(&self, version: &str, output: Option<&str>) -> ConfigResult<String> {
        let mut doc: DocumentMut = self.content.parse()?;
        if let Some(output) = output {
            doc["output"] = toml_edit::value(output);
        }
        Ok(format!("# ASPeo PARAMETER FILE (v{})\n{}", version, doc))
    }
}
