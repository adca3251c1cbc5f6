//! Output directory layout.
//!
//! Later stages and re-runs find earlier artifacts only by recomputing
//! these paths, so the constants below are part of the on-disk contract:
//!
//! ```text
//! <output>/
//! ├── BA/ba-*                         bundle adjustment
//! ├── MP/PAN/mp-pan<id>.tif           map-projected panchromatic
//! ├── MP/MS/mp-ms<id>.tif             map-projected multispectral
//! ├── MP/PANSHARP/pansharp<id>.tif    pansharpened
//! ├── MP/ALIGNED/align-<id>.tif       aligned images
//! ├── STEREO/<id>_<id>[_<id>]/stereo-*  one fragment per pair/triplet
//! ├── DEM/reference-dem.tif           retrieved elevation model
//! ├── orbits.kml
//! └── dem.tif                         mosaic
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::models::Pair;

pub const BA_DIR: &str = "BA";
pub const BA_PREFIX: &str = "ba";
pub const MP_PAN_DIR: &str = "MP/PAN";
pub const MP_PAN_PREFIX: &str = "mp-pan";
pub const MP_MS_DIR: &str = "MP/MS";
pub const MP_MS_PREFIX: &str = "mp-ms";
pub const PANSHARP_DIR: &str = "MP/PANSHARP";
pub const PANSHARP_PREFIX: &str = "pansharp";
pub const ALIGNED_DIR: &str = "MP/ALIGNED";
pub const ALIGNED_PREFIX: &str = "align-";
pub const STEREO_DIR: &str = "STEREO";
pub const STEREO_PREFIX: &str = "stereo";
pub const DEM_DIR: &str = "DEM";
pub const REFERENCE_DEM: &str = "reference-dem.tif";
pub const ORBITS_KML: &str = "orbits.kml";
pub const MOSAIC: &str = "dem.tif";
pub const BLACK_LEFT: &str = "black_left.tsai";
pub const BLACK_RIGHT: &str = "black_right.tsai";

/// `path` with `suffix` appended to its last component.
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = OsString::from(path.as_os_str());
    s.push(suffix);
    PathBuf::from(s)
}

/// Path namer rooted at the workflow output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Output prefix shared by every bundle adjustment run.
    pub fn bundle_adjust_prefix(&self) -> PathBuf {
        self.root.join(BA_DIR).join(BA_PREFIX)
    }

    /// The bundle adjustment prefix, if a previous run left its directory.
    pub fn existing_bundle_adjust_prefix(&self) -> Option<PathBuf> {
        self.root
            .join(BA_DIR)
            .is_dir()
            .then(|| self.bundle_adjust_prefix())
    }

    pub fn map_projected_pan(&self, id: &str) -> PathBuf {
        self.prefixed(MP_PAN_DIR, MP_PAN_PREFIX, id, ".tif")
    }

    pub fn map_projected_ms(&self, id: &str) -> PathBuf {
        self.prefixed(MP_MS_DIR, MP_MS_PREFIX, id, ".tif")
    }

    pub fn pansharpened(&self, id: &str) -> PathBuf {
        self.prefixed(PANSHARP_DIR, PANSHARP_PREFIX, id, ".tif")
    }

    /// Aligned image of source `id`.
    pub fn aligned(&self, id: &str) -> PathBuf {
        self.prefixed(ALIGNED_DIR, ALIGNED_PREFIX, id, ".tif")
    }

    pub fn stereo_dir(&self) -> PathBuf {
        self.root.join(STEREO_DIR)
    }

    /// Output prefix of one pair or triplet.
    pub fn fragment(&self, pair: &Pair) -> Fragment {
        Fragment {
            prefix: self.stereo_dir().join(pair.stem()).join(STEREO_PREFIX),
        }
    }

    pub fn black_camera_left(&self) -> PathBuf {
        self.stereo_dir().join(BLACK_LEFT)
    }

    pub fn black_camera_right(&self) -> PathBuf {
        self.stereo_dir().join(BLACK_RIGHT)
    }

    pub fn reference_dem(&self) -> PathBuf {
        self.root.join(DEM_DIR).join(REFERENCE_DEM)
    }

    pub fn orbits_kml(&self) -> PathBuf {
        self.root.join(ORBITS_KML)
    }

    pub fn mosaic(&self) -> PathBuf {
        self.root.join(MOSAIC)
    }

    fn prefixed(&self, dir: &str, prefix: &str, name: &str, ext: &str) -> PathBuf {
        self.root.join(dir).join(format!("{}{}{}", prefix, name, ext))
    }
}

/// Artifact paths of one stereo fragment (`STEREO/<stem>/stereo`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    prefix: PathBuf,
}

impl Fragment {
    /// Output prefix passed to the tools.
    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// `<prefix><suffix>`
    pub fn file(&self, suffix: &str) -> PathBuf {
        with_suffix(&self.prefix, suffix)
    }

    pub fn left(&self) -> PathBuf {
        self.file("-L.tif")
    }

    pub fn right(&self) -> PathBuf {
        self.file("-R.tif")
    }

    /// Filtered disparity.
    pub fn disparity(&self) -> PathBuf {
        self.file("-F.tif")
    }

    pub fn ncc(&self) -> PathBuf {
        self.file("-ncc.tif")
    }

    pub fn point_cloud(&self) -> PathBuf {
        self.file("-pc.tif")
    }

    pub fn aligned_cloud(&self) -> PathBuf {
        self.file("-pc_aligned.tif")
    }

    pub fn dem(&self) -> PathBuf {
        self.file("-dem.tif")
    }
}
