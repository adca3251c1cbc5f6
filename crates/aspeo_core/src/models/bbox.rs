//! Longitude/latitude bounding box.

use serde::{Deserialize, Serialize};

/// Padding fraction applied on each side before fetching elevation tiles.
pub const BBOX_SAFETY_PADDING: f64 = 0.02;

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BBox {
    pub fn new(min_lon: f64, max_lon: f64, min_lat: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            max_lon,
            min_lat,
            max_lat,
        }
    }

    /// Smallest box enclosing `(lon, lat)` points.
    ///
    /// Returns `None` when there are no points.
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        points.into_iter().fold(None, |acc, (lon, lat)| {
            let point = BBox::new(lon, lon, lat, lat);
            Some(match acc {
                Some(b) => b.union(&point),
                None => point,
            })
        })
    }

    /// Box spanning the extreme bounds of both boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            min_lon: self.min_lon.min(other.min_lon),
            max_lon: self.max_lon.max(other.max_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    /// Longitude span.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Latitude span.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Grow every side by `fraction` of its axis span.
    pub fn padded(&self, fraction: f64) -> BBox {
        let dlon = self.width() * fraction;
        let dlat = self.height() * fraction;
        BBox {
            min_lon: self.min_lon - dlon,
            max_lon: self.max_lon + dlon,
            min_lat: self.min_lat - dlat,
            max_lat: self.max_lat + dlat,
        }
    }

    /// Whether `other` lies strictly inside on all four sides.
    pub fn strictly_contains(&self, other: &BBox) -> bool {
        self.min_lon < other.min_lon
            && self.max_lon > other.max_lon
            && self.min_lat < other.min_lat
            && self.max_lat > other.max_lat
    }
}
