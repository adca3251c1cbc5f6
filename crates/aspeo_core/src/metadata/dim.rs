//! Pleiades DIMAP (`DIM_*.XML`) descriptor reader.
//!
//! Only the fields the workflows and `aspeo info` need are read:
//!
//! ```xml
//! <Dimap_Document>
//!   <Dataset_Identification><DATASET_NAME>...</DATASET_NAME></Dataset_Identification>
//!   <Dataset_Content>
//!     <CLOUD_COVERAGE>0</CLOUD_COVERAGE>
//!     <Dataset_Extent>
//!       <Vertex><LON>5.71</LON><LAT>45.21</LAT></Vertex>
//!       ...
//!     </Dataset_Extent>
//!   </Dataset_Content>
//!   <Raster_Data>
//!     <Data_Access><Data_Files><Data_File>
//!       <DATA_FILE_PATH href="IMG_PHR1A_P_001.TIF"/>
//!     </Data_File></Data_Files></Data_Access>
//!     ...
//!   </Raster_Data>
//! </Dimap_Document>
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::Node;

use crate::models::BBox;
use crate::resolve::{ResolveError, ResolveResult};

/// Find the single `DIM*.XML` in a folder, or accept a file path as is.
pub fn resolve_dim(path: &Path) -> ResolveResult<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    if !path.is_dir() {
        return Err(ResolveError::NotFolderOrFile(path.to_path_buf()));
    }

    let entries = fs::read_dir(path).map_err(|e| ResolveError::read(path, e))?;
    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ResolveError::read(path, e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("DIM") && name.ends_with(".XML") {
            matches.push(entry.path());
        }
    }

    match matches.len() {
        1 => Ok(matches.remove(0)),
        found => Err(ResolveError::DimNotResolved {
            path: path.to_path_buf(),
            found,
        }),
    }
}

/// Fields read from a DIM descriptor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DimInfo {
    /// Descriptor path.
    pub path: PathBuf,
    pub dataset_name: Option<String>,
    pub imaging_date: Option<String>,
    pub imaging_time: Option<String>,
    pub job_id: Option<String>,
    pub dim_version: Option<String>,
    /// RPC camera model, relative to the descriptor folder.
    pub rpc_path: Option<String>,
    /// Raster file, relative to the descriptor folder.
    pub raster_path: Option<String>,
    pub nrows: Option<u64>,
    pub ncols: Option<u64>,
    pub data_type: Option<String>,
    pub nbits: Option<u32>,
    pub sign: Option<String>,
    pub surface_area: Option<String>,
    pub cloud_coverage: Option<String>,
    pub snow_coverage: Option<String>,
    /// Footprint polygon as `(lon, lat)`.
    pub vertices: Vec<(f64, f64)>,
}

impl DimInfo {
    /// Resolve and read a descriptor from a folder or file.
    pub fn open(path: &Path) -> ResolveResult<Self> {
        let dim = resolve_dim(path)?;
        Self::read(&dim)
    }

    /// Read a descriptor file.
    pub fn read(path: &Path) -> ResolveResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ResolveError::read(path, e))?;
        Self::parse(path, &content)
    }

    /// Parse descriptor content. `path` is recorded and used to resolve
    /// relative file references.
    pub fn parse(path: &Path, xml: &str) -> ResolveResult<Self> {
        let doc = roxmltree::Document::parse(xml)
            .map_err(|e| ResolveError::malformed_dim(path, format!("XML parse error: {}", e)))?;
        let root = doc.root_element();

        let vertices = match find(root, &["Dataset_Content", "Dataset_Extent"]) {
            Some(extent) => parse_vertices(path, extent)?,
            None => Vec::new(),
        };

        Ok(Self {
            path: path.to_path_buf(),
            dataset_name: text(root, &["Dataset_Identification", "DATASET_NAME"]),
            imaging_date: text(
                root,
                &[
                    "Dataset_Sources",
                    "Source_Identification",
                    "Strip_Source",
                    "IMAGING_DATE",
                ],
            ),
            imaging_time: text(
                root,
                &[
                    "Dataset_Sources",
                    "Source_Identification",
                    "Strip_Source",
                    "IMAGING_TIME",
                ],
            ),
            job_id: text(root, &["Product_Information", "Delivery_Identification", "JOB_ID"]),
            dim_version: attribute(
                root,
                &["Metadata_Identification", "METADATA_FORMAT"],
                "version",
            ),
            rpc_path: attribute(
                root,
                &[
                    "Geoposition",
                    "Geoposition_Models",
                    "Rational_Function_Model",
                    "Component",
                    "COMPONENT_PATH",
                ],
                "href",
            ),
            raster_path: attribute(
                root,
                &[
                    "Raster_Data",
                    "Data_Access",
                    "Data_Files",
                    "Data_File",
                    "DATA_FILE_PATH",
                ],
                "href",
            ),
            nrows: text(root, &["Raster_Data", "Raster_Dimensions", "NROWS"])
                .and_then(|v| v.parse().ok()),
            ncols: text(root, &["Raster_Data", "Raster_Dimensions", "NCOLS"])
                .and_then(|v| v.parse().ok()),
            data_type: text(root, &["Raster_Data", "Raster_Encoding", "DATA_TYPE"]),
            nbits: text(root, &["Raster_Data", "Raster_Encoding", "NBITS"])
                .and_then(|v| v.parse().ok()),
            sign: text(root, &["Raster_Data", "Raster_Encoding", "SIGN"]),
            surface_area: text(root, &["Dataset_Content", "SURFACE_AREA"]),
            cloud_coverage: text(root, &["Dataset_Content", "CLOUD_COVERAGE"]),
            snow_coverage: text(root, &["Dataset_Content", "SNOW_COVERAGE"]),
            vertices,
        })
    }

    /// Folder holding the descriptor.
    pub fn folder(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Panchromatic raster: the declared data file, else `IMG_<name>.TIF`.
    pub fn pan_image(&self) -> PathBuf {
        let name = match self.raster_path {
            Some(ref href) => href.clone(),
            None => {
                let stem = self.stem();
                let base = stem.strip_prefix("DIM_").unwrap_or(&stem);
                format!("IMG_{}.TIF", base)
            }
        };
        self.folder().join(name)
    }

    /// RPC camera model: the declared component, else `RPC_<name>.XML`.
    pub fn rpc_camera(&self) -> PathBuf {
        let name = match self.rpc_path {
            Some(ref href) => href.clone(),
            None => {
                let stem = self.stem();
                let base = stem.strip_prefix("DIM_").unwrap_or(&stem);
                format!("RPC_{}.XML", base)
            }
        };
        self.folder().join(name)
    }

    /// Bounding box of the footprint vertices.
    pub fn footprint(&self) -> Option<BBox> {
        BBox::from_points(self.vertices.iter().copied())
    }
}

impl fmt::Display for DimInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn or_dash<T: ToString>(value: &Option<T>) -> String {
            value
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string())
        }

        writeln!(f, "Pleiadesinfo: {}", or_dash(&self.dataset_name))?;
        writeln!(f)?;
        writeln!(
            f,
            "date: {} {}",
            or_dash(&self.imaging_date),
            or_dash(&self.imaging_time)
        )?;
        writeln!(
            f,
            "DIM (v{}): {}",
            or_dash(&self.dim_version),
            self.path.display()
        )?;
        writeln!(f, "job: {}", or_dash(&self.job_id))?;
        writeln!(f, "nrow, ncol: {}, {}", or_dash(&self.nrows), or_dash(&self.ncols))?;
        writeln!(
            f,
            "datatype: {} {} {}",
            or_dash(&self.data_type),
            or_dash(&self.nbits),
            or_dash(&self.sign)
        )?;
        writeln!(
            f,
            "cloud, snow: {}, {}",
            or_dash(&self.cloud_coverage),
            or_dash(&self.snow_coverage)
        )?;
        match self.footprint() {
            Some(b) => write!(
                f,
                "footprint: lon [{}, {}] lat [{}, {}]",
                b.min_lon, b.max_lon, b.min_lat, b.max_lat
            ),
            None => write!(f, "footprint: -"),
        }
    }
}

/// Descend through the first child element matching each tag.
fn find<'a, 'input>(node: Node<'a, 'input>, path: &[&str]) -> Option<Node<'a, 'input>> {
    path.iter().try_fold(node, |current, tag| {
        current
            .children()
            .find(|n| n.is_element() && n.tag_name().name() == *tag)
    })
}

fn text(node: Node<'_, '_>, path: &[&str]) -> Option<String> {
    find(node, path)
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn attribute(node: Node<'_, '_>, path: &[&str], name: &str) -> Option<String> {
    find(node, path)
        .and_then(|n| n.attribute(name))
        .map(str::to_string)
}

fn parse_vertices(path: &Path, extent: Node<'_, '_>) -> ResolveResult<Vec<(f64, f64)>> {
    let mut vertices = Vec::new();
    for vertex in extent
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "Vertex")
    {
        let coord = |tag: &str| -> ResolveResult<f64> {
            let value = text(vertex, &[tag]).ok_or_else(|| {
                ResolveError::malformed_dim(path, format!("Vertex without {}", tag))
            })?;
            value.parse().map_err(|_| {
                ResolveError::malformed_dim(path, format!("invalid {} '{}'", tag, value))
            })
        };
        vertices.push((coord("LON")?, coord("LAT")?));
    }
    Ok(vertices)
}
