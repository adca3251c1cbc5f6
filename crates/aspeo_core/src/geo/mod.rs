//! Geospatial helpers: footprint aggregation and elevation model retrieval.

pub mod dem;

use crate::metadata::DimInfo;
use crate::models::{BBox, Source, BBOX_SAFETY_PADDING};
use crate::resolve::{ResolveError, ResolveResult};

/// Union of every source's DIM footprint, unpadded.
///
/// Every source needs a DIM descriptor with at least one vertex.
pub fn merge_footprints(sources: &[Source]) -> ResolveResult<BBox> {
    let mut merged: Option<BBox> = None;
    for source in sources {
        let dim = source
            .dim
            .as_deref()
            .ok_or_else(|| ResolveError::MissingDim(source.id.clone()))?;
        let info = DimInfo::read(dim)?;
        let footprint = info
            .footprint()
            .ok_or_else(|| ResolveError::MissingVertices(dim.to_path_buf()))?;
        merged = Some(match merged {
            Some(b) => b.union(&footprint),
            None => footprint,
        });
    }
    merged.ok_or(ResolveError::NoSources)
}

/// Merged footprint padded on each side for tile retrieval.
pub fn aggregate_bbox(sources: &[Source]) -> ResolveResult<BBox> {
    let merged = merge_footprints(sources)?;
    let padded = merged.padded(BBOX_SAFETY_PADDING);
    tracing::debug!("Footprint {:?}, padded {:?}", merged, padded);
    Ok(padded)
}
