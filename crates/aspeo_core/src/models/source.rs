//! Source records and their builder.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Column names understood in a source description file, in positional order.
///
/// A header-less file assigns its columns to these keys left to right.
pub const CANONICAL_COLUMNS: [&str; 7] = ["id", "pan", "ms", "cam", "mp", "cam-ms", "pleiades"];

/// Path-bearing fields of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceField {
    /// Panchromatic image.
    Pan,
    /// Multispectral image.
    Ms,
    /// Camera model of the panchromatic image.
    Cam,
    /// Map-projected image.
    Mp,
    /// Camera model of the multispectral image.
    CamMs,
    /// Raw product folder holding a DIM descriptor.
    Pleiades,
}

impl SourceField {
    /// All fields, in canonical column order.
    pub const ALL: [SourceField; 6] = [
        SourceField::Pan,
        SourceField::Ms,
        SourceField::Cam,
        SourceField::Mp,
        SourceField::CamMs,
        SourceField::Pleiades,
    ];

    /// Key used in configuration files and headers.
    pub fn key(&self) -> &'static str {
        match self {
            SourceField::Pan => "pan",
            SourceField::Ms => "ms",
            SourceField::Cam => "cam",
            SourceField::Mp => "mp",
            SourceField::CamMs => "cam-ms",
            SourceField::Pleiades => "pleiades",
        }
    }

    /// Parse a configuration/header key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl fmt::Display for SourceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One physical acquisition.
///
/// Sources are immutable once built: anything discovered later in a run
/// (a map-projected image found on disk, metadata-derived paths) goes
/// through [`Source::to_builder`] and produces a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Source {
    /// Unique identifier within the run.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pan: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ms: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cam: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mp: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cam_ms: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pleiades: Option<PathBuf>,
    /// DIM metadata descriptor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dim: Option<PathBuf>,
}

impl Source {
    /// Start building a source with the given id.
    pub fn builder(id: impl Into<String>) -> SourceBuilder {
        SourceBuilder::new(id)
    }

    /// Get a path field.
    pub fn get(&self, field: SourceField) -> Option<&Path> {
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

    /// Whether both multispectral image and camera are known.
    pub fn has_multispectral(&self) -> bool {
        self.ms.is_some() && self.cam_ms.is_some()
    }

    /// Copy this record into a builder for derivation.
    pub fn to_builder(&self) -> SourceBuilder {
        SourceBuilder {
            source: self.clone(),
        }
    }
}

/// Builder for [`Source`] records.
#[derive(Debug, Clone)]
pub struct SourceBuilder {
    source: Source,
}

impl SourceBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            source: Source {
                id: id.into(),
                pan: None,
                ms: None,
                cam: None,
                mp: None,
                cam_ms: None,
                pleiades: None,
                dim: None,
            },
        }
    }

    /// Set a path field, replacing any previous value.
    pub fn field(mut self, field: SourceField, value: impl Into<PathBuf>) -> Self {
        self.set(field, Some(value.into()));
        self
    }

    /// Set a path field only when it has no value yet.
    pub fn field_if_unset(mut self, field: SourceField, value: impl Into<PathBuf>) -> Self {
        if self.get(field).is_none() {
            self.set(field, Some(value.into()));
        }
        self
    }

    /// Set the DIM descriptor.
    pub fn dim(mut self, dim: impl Into<PathBuf>) -> Self {
        self.source.dim = Some(dim.into());
        self
    }

    /// DIM descriptor set so far.
    pub fn dim_path(&self) -> Option<&Path> {
        self.source.dim.as_deref()
    }

    /// Current value of a field.
    pub fn get(&self, field: SourceField) -> Option<&Path> {
        self.source.get(field)
    }

    /// Id of the source under construction.
    pub fn id(&self) -> &str {
        &self.source.id
    }

    /// Rewrite every set field with `f`.
    pub fn map_fields(mut self, mut f: impl FnMut(SourceField, &Path) -> PathBuf) -> Self {
        for field in SourceField::ALL {
            if let Some(current) = self.get(field).map(Path::to_path_buf) {
                let mapped = f(field, &current);
                self.set(field, Some(mapped));
            }
        }
        self
    }

    pub fn build(self) -> Source {
        self.source
    }

    fn set(&mut self, field: SourceField, value: Option<PathBuf>) {
        let slot = match field {
            SourceField::Pan => &mut self.source.pan,
            SourceField::Ms => &mut self.source.ms,
            SourceField::Cam => &mut self.source.cam,
            SourceField::Mp => &mut self.source.mp,
            SourceField::CamMs => &mut self.source.cam_ms,
            SourceField::Pleiades => &mut self.source.pleiades,
        };
        *slot = value;
    }
}
