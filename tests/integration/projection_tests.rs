//! Property tests for the Mercator projection table.
//!
//! Tests verify:
//! - Pixel -> geo -> pixel round-trips within one pixel at every zoom
//! - Tile bounds are well ordered and neighbors share edges

use proptest::prelude::*;

use tile_render_server::projection::{PixelPoint, TileCoord, TileProjection, DEFAULT_MAX_ZOOM};

proptest! {
    #[test]
    fn test_pixel_roundtrip_property(
        zoom in 0u32..=DEFAULT_MAX_ZOOM,
        fx in 0.0..1.0_f64,
        fy in 0.0..1.0_f64,
    ) {
        let projection = TileProjection::default();
        let size = projection.level(zoom).unwrap().size;
        let px = PixelPoint::new((fx * size).floor(), (fy * size).floor());

        let geo = projection.geo_from_pixel(px, zoom);
        let back = projection.pixel_from_geo(geo, zoom);

        prop_assert!(
            (back.x - px.x).abs() <= 1.0,
            "x roundtrip failed at zoom {}: {} -> {}", zoom, px.x, back.x
        );
        prop_assert!(
            (back.y - px.y).abs() <= 1.0,
            "y roundtrip failed at zoom {}: {} -> {}", zoom, px.y, back.y
        );
    }

    #[test]
    fn test_tile_bounds_property(
        zoom in 0u32..=DEFAULT_MAX_ZOOM,
        fx in 0.0..1.0_f64,
        fy in 0.0..1.0_f64,
    ) {
        let projection = TileProjection::default();
        let per_axis = 1u64 << zoom;
        let x = ((fx * per_axis as f64) as u64).min(per_axis - 1) as u32;
        let y = ((fy * per_axis as f64) as u64).min(per_axis - 1) as u32;
        let coord = TileCoord::new(zoom, x, y);

        let bounds = projection.tile_bounds(coord, 256, 256);
        prop_assert!(bounds.min.lon < bounds.max.lon);
        prop_assert!(bounds.min.lat < bounds.max.lat);
        prop_assert!(bounds.min.lon >= -180.0 - 1e-9 && bounds.max.lon <= 180.0 + 1e-9);
        prop_assert!(bounds.min.lat >= -85.06 && bounds.max.lat <= 85.06);

        if x + 1 < per_axis as u32 {
            let east = projection.tile_bounds(TileCoord::new(zoom, x + 1, y), 256, 256);
            prop_assert!((east.min.lon - bounds.max.lon).abs() < 1e-9);
        }
        if y + 1 < per_axis as u32 {
            let south = projection.tile_bounds(TileCoord::new(zoom, x, y + 1), 256, 256);
            prop_assert!((south.max.lat - bounds.min.lat).abs() < 1e-9);
        }
    }
}
