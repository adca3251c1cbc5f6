//! Data models for ASPeo.
//!
//! This module contains the core records shared by every workflow:
//! - `Source`: one acquisition with its associated file paths
//! - `Pair`: a stereo pair or triplet of source ids
//! - `BBox`: an axis-aligned longitude/latitude box

mod bbox;
mod pair;
mod source;

pub use bbox::{BBox, BBOX_SAFETY_PADDING};
pub use pair::Pair;
pub use source::{Source, SourceBuilder, SourceField, CANONICAL_COLUMNS};
