//! Tile addressing and projection math.
//!
//! Converts between pixel coordinates at a zoom level and EPSG:4326
//! longitude/latitude using the spherical pseudo-Mercator mapping used by
//! XYZ tile servers.
//!
//! # Components
//!
//! - [`TileProjection`]: per-zoom constant table with forward/inverse mapping
//! - [`TileCoord`]: `(zoom, x, y)` tile address
//! - [`PixelPoint`], [`GeoPoint`], [`GeoBounds`]: coordinate value types
//!
//! # Example
//!
//! ```
//! use tile_render_server::projection::{TileCoord, TileProjection};
//!
//! let projection = TileProjection::default();
//! let bounds = projection.tile_bounds(TileCoord::new(0, 0, 0), 256, 256);
//! assert!((bounds.width() - 360.0).abs() < 1e-9);
//! ```

mod mercator;
mod types;

pub use mercator::{TileProjection, ZoomLevel, BASE_TILE_SIZE, DEFAULT_MAX_ZOOM};
pub use types::{GeoBounds, GeoPoint, PixelPoint, TileCoord};
