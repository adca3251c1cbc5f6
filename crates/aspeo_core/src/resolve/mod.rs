//! Source and pair resolution.
//!
//! Turns the workflow configuration into the immutable [`Source`] list and
//! the ordered [`Pair`] list every stage works from.
//!
//! [`Source`]: crate::models::Source
//! [`Pair`]: crate::models::Pair

mod errors;
mod pairs;
mod source_file;
mod sources;
mod templating;

pub use errors::{ResolveError, ResolveResult};
pub use pairs::{
    check_fragments, full_pairs, ids_from_pairs, parse_pairs, read_pairs, resolve_pairs,
    PairFileOptions,
};
pub use source_file::{parse_source_rows, read_source_file};
pub use sources::{resolve_sources, source_by_id, source_ids};
pub use templating::PathTemplating;
