//! Coordinate types shared by the projection, cache and queue layers.

use std::fmt;

// =============================================================================
// Tile Coordinate
// =============================================================================

/// Address of a single tile: zoom level plus column/row index.
///
/// Row 0 is the northern edge of the map. Valid tiles satisfy
/// `x, y < 2^zoom`, which the projection math does not enforce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Zoom level (0 = whole world in one tile)
    pub zoom: u32,

    /// Tile column (0-indexed from the antimeridian, west to east)
    pub x: u32,

    /// Tile row (0-indexed from the north)
    pub y: u32,
}

impl TileCoord {
    /// Create a new tile coordinate.
    pub fn new(zoom: u32, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Number of tiles along one axis at this zoom level.
    pub fn tiles_per_axis(&self) -> u64 {
        1u64 << self.zoom.min(63)
    }

    /// Check that `x` and `y` fall inside the tile grid for this zoom.
    pub fn is_valid(&self) -> bool {
        let n = self.tiles_per_axis();
        u64::from(self.x) < n && u64::from(self.y) < n
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

// =============================================================================
// Points
// =============================================================================

/// A point in pixel space. Only meaningful together with a zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A geographic point in EPSG:4326 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Longitude in degrees, positive east
    pub lon: f64,

    /// Latitude in degrees, positive north
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Geographic extent of a tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    /// South-west corner
    pub min: GeoPoint,

    /// North-east corner
    pub max: GeoPoint,
}

impl GeoBounds {
    /// Longitude span in degrees.
    pub fn width(&self) -> f64 {
        self.max.lon - self.min.lon
    }

    /// Latitude span in degrees.
    pub fn height(&self) -> f64 {
        self.max.lat - self.min.lat
    }
}
