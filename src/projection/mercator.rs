//! Spherical pseudo-Mercator projection between pixels and lon/lat.
//!
//! The projection keeps a table of per-zoom constants so that converting a
//! point is a handful of multiplications plus one transcendental call. Each
//! zoom level doubles the pixel extent of the previous one, so every constant
//! doubles as well.

use std::f64::consts::PI;

use super::types::{GeoBounds, GeoPoint, PixelPoint, TileCoord};

/// Pixel size of the whole world at zoom 0.
pub const BASE_TILE_SIZE: f64 = 256.0;

/// Highest zoom level served by default.
pub const DEFAULT_MAX_ZOOM: u32 = 20;

/// Bound applied to `sin(lat)` so the Mercator logarithm stays finite at the poles.
const SIN_LAT_LIMIT: f64 = 0.9999;

// =============================================================================
// Zoom Level Constants
// =============================================================================

/// Precomputed constants for a single zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLevel {
    /// Pixel coordinate of the equator / prime meridian (same for both axes)
    pub origin: f64,

    /// Pixels per degree of longitude
    pub deg_scale: f64,

    /// Pixels per radian, used for the Mercator latitude term
    pub rad_scale: f64,

    /// Total pixel extent of the world at this level
    pub size: f64,
}

impl ZoomLevel {
    fn for_extent(size: f64) -> Self {
        Self {
            origin: size / 2.0,
            deg_scale: size / 360.0,
            rad_scale: size / (2.0 * PI),
            size,
        }
    }
}

// =============================================================================
// Tile Projection
// =============================================================================

/// Lookup table of projection constants for zoom levels `0..levels`.
///
/// Immutable after construction; share it behind an `Arc` between workers.
///
/// # Example
///
/// ```
/// use tile_render_server::projection::{GeoPoint, TileProjection};
///
/// let projection = TileProjection::new(21);
/// let px = projection.pixel_from_geo(GeoPoint::new(0.0, 0.0), 0);
/// assert_eq!((px.x, px.y), (128.0, 128.0));
/// ```
#[derive(Debug, Clone)]
pub struct TileProjection {
    levels: Vec<ZoomLevel>,
}

impl TileProjection {
    /// Build a table with `levels` entries (zoom `0..levels`).
    pub fn new(levels: usize) -> Self {
        let mut size = BASE_TILE_SIZE;
        let mut table = Vec::with_capacity(levels);
        for _ in 0..levels {
            table.push(ZoomLevel::for_extent(size));
            size *= 2.0;
        }
        Self { levels: table }
    }

    /// Build a table covering zoom `0..=max_zoom`.
    pub fn with_max_zoom(max_zoom: u32) -> Self {
        Self::new(max_zoom as usize + 1)
    }

    /// Number of zoom levels in the table.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Highest zoom level in the table, or `None` if the table is empty.
    pub fn max_zoom(&self) -> Option<u32> {
        self.levels.len().checked_sub(1).map(|z| z as u32)
    }

    /// Constants for a zoom level, if the table covers it.
    pub fn level(&self, zoom: u32) -> Option<&ZoomLevel> {
        self.levels.get(zoom as usize)
    }

    /// Whether `zoom` is covered by this table.
    pub fn supports_zoom(&self, zoom: u32) -> bool {
        (zoom as usize) < self.levels.len()
    }

    /// Convert a geographic point to (rounded) pixel coordinates.
    ///
    /// # Panics
    ///
    /// Panics if `zoom` is beyond the table; check with [`supports_zoom`](Self::supports_zoom).
    pub fn pixel_from_geo(&self, geo: GeoPoint, zoom: u32) -> PixelPoint {
        let level = &self.levels[zoom as usize];
        let x = (level.origin + geo.lon * level.deg_scale).round();
        let f = (geo.lat * PI / 180.0)
            .sin()
            .clamp(-SIN_LAT_LIMIT, SIN_LAT_LIMIT);
        let y = (level.origin - 0.5 * ((1.0 + f) / (1.0 - f)).ln() * level.rad_scale).round();
        PixelPoint::new(x, y)
    }

    /// Convert pixel coordinates back to a geographic point.
    ///
    /// # Panics
    ///
    /// Panics if `zoom` is beyond the table; check with [`supports_zoom`](Self::supports_zoom).
    pub fn geo_from_pixel(&self, px: PixelPoint, zoom: u32) -> GeoPoint {
        let level = &self.levels[zoom as usize];
        let lon = (px.x - level.origin) / level.deg_scale;
        let g = (px.y - level.origin) / -level.rad_scale;
        let lat = (180.0 / PI) * (2.0 * g.exp().atan() - 0.5 * PI);
        GeoPoint::new(lon, lat)
    }

    /// Geographic bounds of a `width` x `height` pixel tile.
    ///
    /// Pixel row 0 is the northern edge, so the south-west corner comes from
    /// the higher pixel row `(y + 1) * height`.
    pub fn tile_bounds(&self, coord: TileCoord, width: u32, height: u32) -> GeoBounds {
        let (w, h) = (f64::from(width), f64::from(height));
        let (x, y) = (f64::from(coord.x), f64::from(coord.y));

        let p0 = PixelPoint::new(x * w, (y + 1.0) * h);
        let p1 = PixelPoint::new((x + 1.0) * w, y * h);

        GeoBounds {
            min: self.geo_from_pixel(p0, coord.zoom),
            max: self.geo_from_pixel(p1, coord.zoom),
        }
    }
}

impl Default for TileProjection {
    fn default() -> Self {
        Self::with_max_zoom(DEFAULT_MAX_ZOOM)
    }
}

// =============================================================================
// Tests
// =============================================================================
