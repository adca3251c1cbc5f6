//! Path templating: `<source-folder>/<prefix><value><suffix>`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::WorkflowConfig;
use crate::models::{SourceBuilder, SourceField};

/// Applies the global folder/prefix/suffix settings to source fields.
#[derive(Debug, Clone, Copy)]
pub struct PathTemplating<'a> {
    config: &'a WorkflowConfig,
}

impl<'a> PathTemplating<'a> {
    pub fn new(config: &'a WorkflowConfig) -> Self {
        Self { config }
    }

    /// Whether a prefix or suffix is configured for `field`.
    pub fn has_affixes(&self, field: SourceField) -> bool {
        let (prefix, suffix) = self.config.affixes(field);
        prefix.is_some() || suffix.is_some()
    }

    /// Whether an unset `field` takes the source id as its value.
    ///
    /// `mp` always does, or `pan` instead with `derive-pan`. Other fields
    /// only when a prefix or suffix is configured for them.
    pub fn defaults_from_id(&self, field: SourceField) -> bool {
        let primary = if self.config.derive_pan {
            SourceField::Pan
        } else {
            SourceField::Mp
        };
        field == primary || self.has_affixes(field)
    }

    /// Qualify one value.
    pub fn qualify(&self, field: SourceField, value: &Path) -> PathBuf {
        let (prefix, suffix) = self.config.affixes(field);
        let mut name = OsString::from(prefix.unwrap_or(""));
        name.push(value.as_os_str());
        name.push(suffix.unwrap_or(""));

        match self.config.source_folder {
            Some(ref folder) => folder.join(name),
            None => PathBuf::from(name),
        }
    }

    /// Default then qualify each of `fields`.
    pub fn apply(&self, builder: SourceBuilder, fields: &[SourceField]) -> SourceBuilder {
        let mut builder = builder;
        for &field in fields {
            if builder.get(field).is_none() && self.defaults_from_id(field) {
                let id = builder.id().to_string();
                builder = builder.field(field, id);
            }
            if let Some(value) = builder.get(field).map(Path::to_path_buf) {
                let qualified = self.qualify(field, &value);
                builder = builder.field(field, qualified);
            }
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;

    fn config(content: &str) -> WorkflowConfig {
        toml::from_str(content).unwrap()
    }

    #[test]
    fn mp_defaults_to_id() {
        let config = config("");
        let templating = PathTemplating::new(&config);
        let source = templating
            .apply(Source::builder("a"), &SourceField::ALL)
            .build();

        assert_eq!(source.mp.as_deref(), Some(Path::new("a")));
        assert!(source.pan.is_none());
        assert!(source.cam.is_none());
    }

    #[test]
    fn derive_pan_switches_default() {
        let config = config("derive-pan = true\n");
        let templating = PathTemplating::new(&config);
        let source = templating
            .apply(Source::builder("a"), &SourceField::ALL)
            .build();

        assert_eq!(source.pan.as_deref(), Some(Path::new("a")));
        assert!(source.mp.is_none());
    }

    #[test]
    fn affixes_and_folder_are_applied() {
        let config = config(
            "source-folder = \"data\"\ncam-prefix = \"RPC_\"\ncam-suffix = \".XML\"\nmp-suffix = \".tif\"\n",
        );
        let templating = PathTemplating::new(&config);
        let source = templating
            .apply(
                Source::builder("a").field(SourceField::Pan, "pan_a.tif"),
                &SourceField::ALL,
            )
            .build();

        assert_eq!(source.pan.as_deref(), Some(Path::new("data/pan_a.tif")));
        assert_eq!(source.cam.as_deref(), Some(Path::new("data/RPC_a.XML")));
        assert_eq!(source.mp.as_deref(), Some(Path::new("data/a.tif")));
        assert!(source.ms.is_none());
    }

    #[test]
    fn fields_outside_the_list_are_untouched() {
        let config = config("pan-prefix = \"P_\"\n");
        let templating = PathTemplating::new(&config);
        let source = templating
            .apply(
                Source::builder("a").field(SourceField::Pan, "/abs/pan.tif"),
                &[SourceField::Mp],
            )
            .build();

        assert_eq!(source.pan.as_deref(), Some(Path::new("/abs/pan.tif")));
    }
}
