//! Reference elevation model retrieval through an external helper.
//!
//! `my_getDemFile.py OPTIONS -o OUTPUT --bbox SOUTH NORTH WEST EAST`

use std::path::Path;

use crate::config::DemRetrievalConfig;
use crate::models::BBox;
use crate::tools::ToolCommand;

/// Availability check: `<helper> -h` must exit with status 0.
pub fn probe_command(config: &DemRetrievalConfig) -> ToolCommand {
    ToolCommand::new(config.command.as_str()).arg("-h")
}

/// Fetch tiles covering `bbox` into `output`.
pub fn retrieval_command(config: &DemRetrievalConfig, output: &Path, bbox: &BBox) -> ToolCommand {
    ToolCommand::new(config.command.as_str())
        .options(&config.options)
        .arg("-o")
        .path(output)
        .arg("--bbox")
        .args([
            bbox.min_lat.to_string(),
            bbox.max_lat.to_string(),
            bbox.min_lon.to_string(),
            bbox.max_lon.to_string(),
        ])
        .output(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolOptions;

    #[test]
    fn bbox_is_south_north_west_east() {
        let config = DemRetrievalConfig {
            options: ToolOptions::new().with("s", "COP30"),
            ..Default::default()
        };
        let cmd = retrieval_command(
            &config,
            Path::new("out/DEM/reference-dem.tif"),
            &BBox::new(5.5, 6.25, 45.0, 45.5),
        );

        assert_eq!(
            cmd.to_string(),
            "my_getDemFile.py -s COP30 -o out/DEM/reference-dem.tif --bbox 45 45.5 5.5 6.25"
        );
        assert_eq!(cmd.outputs().len(), 1);
    }

    #[test]
    fn probe_asks_for_help() {
        let cmd = probe_command(&DemRetrievalConfig::default());
        assert_eq!(cmd.to_string(), "my_getDemFile.py -h");
    }
}
