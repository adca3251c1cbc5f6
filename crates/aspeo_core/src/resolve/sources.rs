//! Source resolution.
//!
//! Order of operations for each source:
//! 1. raw record (inline, file row, or bare id from the pairing file)
//! 2. `pleiades` folder templated
//! 3. DIM autofill of `dim`, `pan`, `cam`
//! 4. defaulting from id and templating of every other field
//!
//! Fields filled from the DIM are already resolved against the product
//! folder and are not templated again.

use std::collections::HashSet;

use super::errors::{ResolveError, ResolveResult};
use super::pairs::{ids_from_pairs, read_pairs, PairFileOptions};
use super::source_file::read_source_file;
use super::templating::PathTemplating;
use crate::config::{SourceRecord, SourceSpec, WorkflowConfig};
use crate::metadata::{resolve_dim, DimInfo};
use crate::models::{Source, SourceBuilder, SourceField};

/// Build the ordered source list of a workflow.
///
/// `first` truncates pairing file lines when ids come from it.
pub fn resolve_sources(config: &WorkflowConfig, first: Option<usize>) -> ResolveResult<Vec<Source>> {
    let builders: Vec<SourceBuilder> = match config.source {
        Some(SourceSpec::Inline(ref records)) => records.iter().map(builder_from_record).collect(),
        Some(SourceSpec::File(ref path)) => read_source_file(path, config.source_header)?
            .iter()
            .map(builder_from_record)
            .collect(),
        None => {
            let path = config.pairs.as_ref().ok_or(ResolveError::NoSources)?;
            let pairs = read_pairs(
                path,
                PairFileOptions {
                    header: config.pairs_header,
                    known_ids: None,
                    first,
                },
            )?;
            ids_from_pairs(&pairs)
                .into_iter()
                .map(SourceBuilder::new)
                .collect()
        }
    };

    let templating = PathTemplating::new(config);
    let others: Vec<SourceField> = SourceField::ALL
        .into_iter()
        .filter(|f| *f != SourceField::Pleiades)
        .collect();

    let mut seen = HashSet::new();
    let mut sources = Vec::with_capacity(builders.len());
    for builder in builders {
        if !seen.insert(builder.id().to_string()) {
            return Err(ResolveError::DuplicateId(builder.id().to_string()));
        }

        let builder = templating.apply(builder, &[SourceField::Pleiades]);
        let (builder, filled) = autofill(builder)?;
        let remaining: Vec<SourceField> = others
            .iter()
            .copied()
            .filter(|f| !filled.contains(f))
            .collect();
        let source = templating.apply(builder, &remaining).build();

        tracing::debug!("Resolved source {:?}", source);
        sources.push(source);
    }
    Ok(sources)
}

fn builder_from_record(record: &SourceRecord) -> SourceBuilder {
    let mut builder = SourceBuilder::new(record.id.clone());
    for field in SourceField::ALL {
        if let Some(value) = record.get(field) {
            builder = builder.field(field, value);
        }
    }
    if let Some(ref dim) = record.dim {
        builder = builder.dim(dim);
    }
    builder
}

/// Fill `dim`, `pan` and `cam` from the product's DIM descriptor.
///
/// Returns the fields that were filled.
fn autofill(builder: SourceBuilder) -> ResolveResult<(SourceBuilder, Vec<SourceField>)> {
    let descriptor = match (builder.get(SourceField::Pleiades), builder.dim_path()) {
        (_, Some(dim)) => resolve_dim(dim)?,
        (Some(folder), None) => resolve_dim(folder)?,
        (None, None) => return Ok((builder, Vec::new())),
    };
    let info = DimInfo::read(&descriptor)?;

    let mut filled = Vec::new();
    let mut builder = builder.dim(descriptor);
    if builder.get(SourceField::Pan).is_none() {
        builder = builder.field(SourceField::Pan, info.pan_image());
        filled.push(SourceField::Pan);
    }
    if builder.get(SourceField::Cam).is_none() {
        builder = builder.field(SourceField::Cam, info.rpc_camera());
        filled.push(SourceField::Cam);
    }
    Ok((builder, filled))
}

/// Ids of `sources`, in order.
pub fn source_ids(sources: &[Source]) -> Vec<String> {
    sources.iter().map(|s| s.id.clone()).collect()
}

/// Look up a source by id.
pub fn source_by_id<'a>(sources: &'a [Source], id: &str) -> ResolveResult<&'a Source> {
    sources
        .iter()
        .find(|s| s.id == id)
        .ok_or_else(|| ResolveError::UnknownSource(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::dim::tests::sample_dim;
    use crate::models::Pair;
    use crate::resolve::resolve_pairs;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn config(content: &str) -> WorkflowConfig {
        toml::from_str(content).unwrap()
    }

    #[test]
    fn header_file_scenario() {
        let dir = tempdir().unwrap();
        let sources_path = dir.path().join("sources.txt");
        let pairs_path = dir.path().join("pairs.txt");
        fs::write(
            &sources_path,
            "id pan cam\na pan_a.tif cam_a.tsai\nb pan_b.tif cam_b.tsai\n",
        )
        .unwrap();
        fs::write(&pairs_path, "a b\n").unwrap();

        let config = config(&format!(
            "source = {:?}\nsource-header = true\npairs = {:?}\n",
            sources_path.display().to_string(),
            pairs_path.display().to_string()
        ));

        let sources = resolve_sources(&config, None).unwrap();
        assert_eq!(source_ids(&sources), vec!["a", "b"]);
        assert_eq!(sources[0].pan.as_deref(), Some(Path::new("pan_a.tif")));
        assert_eq!(sources[1].cam.as_deref(), Some(Path::new("cam_b.tsai")));
        assert_eq!(sources[0].mp.as_deref(), Some(Path::new("a")));

        let pairs = resolve_pairs(&config, &source_ids(&sources), None).unwrap();
        assert_eq!(pairs, vec![Pair::stereo("a", "b")]);
    }

    #[test]
    fn ids_come_from_pairs_without_source() {
        let dir = tempdir().unwrap();
        let pairs_path = dir.path().join("pairs.txt");
        fs::write(&pairs_path, "b a 0.3\nc a 0.1\n").unwrap();

        let config = config(&format!(
            "pairs = {:?}\nmp-prefix = \"mp-\"\nmp-suffix = \".tif\"\n",
            pairs_path.display().to_string()
        ));

        let sources = resolve_sources(&config, Some(2)).unwrap();
        assert_eq!(source_ids(&sources), vec!["b", "a", "c"]);
        assert_eq!(sources[0].mp.as_deref(), Some(Path::new("mp-b.tif")));
    }

    #[test]
    fn missing_source_and_pairs_is_an_error() {
        assert!(matches!(
            resolve_sources(&config(""), None),
            Err(ResolveError::NoSources)
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let config = config("[[source]]\nid = \"a\"\n[[source]]\nid = \"a\"\n");
        assert!(matches!(
            resolve_sources(&config, None),
            Err(ResolveError::DuplicateId(id)) if id == "a"
        ));
    }

    #[test]
    fn pleiades_folder_autofills_pan_and_cam() {
        let dir = tempdir().unwrap();
        let product = dir.path().join("raw").join("a");
        fs::create_dir_all(&product).unwrap();
        fs::write(
            product.join("DIM_PHR1A_P_001.XML"),
            sample_dim("PHR1A_P_001", (5.5, 5.75), (45.0, 45.25)),
        )
        .unwrap();

        let raw = dir.path().join("raw").display().to_string();
        let config = config(&format!(
            "derive-pan = true\npleiades-prefix = \"{}/\"\ncam-suffix = \".ignored\"\n\n[[source]]\nid = \"a\"\n",
            raw
        ));

        let sources = resolve_sources(&config, None).unwrap();
        let source = &sources[0];
        assert_eq!(source.pleiades.as_deref(), Some(product.as_path()));
        assert_eq!(
            source.dim.as_deref(),
            Some(product.join("DIM_PHR1A_P_001.XML").as_path())
        );
        assert_eq!(
            source.pan,
            Some(product.join("IMG_PHR1A_P_001_R1C1.JP2"))
        );
        assert_eq!(source.cam, Some(product.join("RPC_PHR1A_P_001.XML")));
        assert!(source.mp.is_none());
    }

    #[test]
    fn ambiguous_pleiades_folder_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("DIM_A.XML"), "<Dimap_Document/>").unwrap();
        fs::write(dir.path().join("DIM_B.XML"), "<Dimap_Document/>").unwrap();

        let config = config(&format!(
            "[[source]]\nid = \"a\"\npleiades = {:?}\n",
            dir.path().display().to_string()
        ));
        assert!(matches!(
            resolve_sources(&config, None),
            Err(ResolveError::DimNotResolved { found: 2, .. })
        ));
    }

    #[test]
    fn source_by_id_reports_unknown() {
        let sources = vec![Source::builder("a").build()];
        assert!(source_by_id(&sources, "a").is_ok());
        assert!(matches!(
            source_by_id(&sources, "z"),
            Err(ResolveError::UnknownSource(_))
        ));
    }
}
