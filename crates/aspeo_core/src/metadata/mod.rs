//! Satellite product metadata.

pub mod dim;

pub use dim::{resolve_dim, DimInfo};
