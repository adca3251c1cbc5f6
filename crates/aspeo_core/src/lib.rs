//! ASPeo Core - workflow orchestration for Ames Stereo Pipeline runs
//!
//! This crate resolves sources and stereo pairs from a workflow file and
//! drives the external ASP tools through the map-projection,
//! pixel-tracking and DSM-generation workflows. It has no CLI dependencies.

pub mod assets;
pub mod config;
pub mod geo;
pub mod layout;
pub mod logging;
pub mod metadata;
pub mod models;
pub mod orchestrator;
pub mod resolve;
pub mod tools;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
