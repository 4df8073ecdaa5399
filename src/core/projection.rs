//! Web Mercator conversions between geographic coordinates, map-space pixels and
//! tile indices at an integer zoom level.
//!
//! These are plain functions with no guards: a latitude at or beyond ±90° runs
//! straight into the Mercator singularity and yields a meaningless value. Callers
//! that accept untrusted coordinates go through [`checked_geo_to_pixel`].

use crate::core::constants::TILE_SIZE;
use crate::core::geo::{GeoPoint, MapPosition};
use crate::{MapError, Result};
use std::f64::consts::PI;

/// Number of tiles along one axis.
pub fn tile_count(zoom: u8) -> i64 {
    1_i64 << zoom
}

/// Width (and height) of the whole map in pixels.
pub fn map_size(zoom: u8) -> i64 {
    TILE_SIZE * tile_count(zoom)
}

pub fn position_to_lon(x: i64, zoom: u8) -> f64 {
    let xmax = map_size(zoom) as f64;
    (x as f64 / xmax * 360.0) % 360.0 - 180.0
}

pub fn position_to_lat(y: i64, zoom: u8) -> f64 {
    let ymax = map_size(zoom) as f64;
    (PI - (2.0 * PI * y as f64) / ymax).sinh().atan().to_degrees()
}

pub fn lon_to_position(lon: f64, zoom: u8) -> i64 {
    let xmax = map_size(zoom) as f64;
    ((lon + 180.0) / 360.0 * xmax).floor() as i64
}

pub fn lat_to_position(lat: f64, zoom: u8) -> i64 {
    let ymax = map_size(zoom) as f64;
    (mercator_y(lat) * ymax).floor() as i64
}

/// Fraction `[0, 1]` of the map height at which `lat` lies.
fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat.to_radians();
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

pub fn pixel_to_geo(position: MapPosition, zoom: u8) -> GeoPoint {
    GeoPoint::new(
        position_to_lon(position.x, zoom),
        position_to_lat(position.y, zoom),
    )
}

pub fn geo_to_pixel(point: GeoPoint, zoom: u8) -> MapPosition {
    MapPosition::new(
        lon_to_position(point.lon, zoom),
        lat_to_position(point.lat, zoom),
    )
}

/// Like [`geo_to_pixel`] but rejects points the projection cannot represent.
pub fn checked_geo_to_pixel(point: GeoPoint, zoom: u8) -> Result<MapPosition> {
    if !point.is_projectable() {
        return Err(MapError::InvalidCoordinates(format!(
            "lon={} lat={} cannot be projected",
            point.lon, point.lat
        ))
        .into());
    }
    Ok(geo_to_pixel(point, zoom))
}

/// Longitude of the west edge of tile column `x`.
pub fn tile_to_lon(x: i64, zoom: u8) -> f64 {
    (x as f64 / tile_count(zoom) as f64 * 360.0) % 360.0 - 180.0
}

/// Latitude of the north edge of tile row `y`.
pub fn tile_to_lat(y: i64, zoom: u8) -> f64 {
    let n = tile_count(zoom) as f64;
    (PI - (2.0 * PI * y as f64) / n).sinh().atan().to_degrees()
}

pub fn tile_to_geo(x: i64, y: i64, zoom: u8) -> GeoPoint {
    GeoPoint::new(tile_to_lon(x, zoom), tile_to_lat(y, zoom))
}

/// Tile column and row containing `point`.
pub fn geo_to_tile(point: GeoPoint, zoom: u8) -> (i64, i64) {
    let n = tile_count(zoom) as f64;
    let x = ((point.lon + 180.0) / 360.0 * n).floor() as i64;
    let y = (mercator_y(point.lat) * n).floor() as i64;
    (x, y)
}

/// Tile column and row containing a map-space pixel.
pub fn position_to_tile(position: MapPosition) -> (i64, i64) {
    (
        position.x.div_euclid(TILE_SIZE),
        position.y.div_euclid(TILE_SIZE),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_count_and_map_size() {
        for zoom in 0..=22u8 {
            assert_eq!(tile_count(zoom), 2_i64.pow(zoom as u32));
            assert_eq!(map_size(zoom), 256 * 2_i64.pow(zoom as u32));
        }
    }

    #[test]
    fn test_round_trip_within_one_pixel() {
        for zoom in 1..=18u8 {
            let xmax = map_size(zoom) as f64;
            let mut lat = -84.0;
            while lat <= 84.0 {
                let mut lon = -179.5;
                while lon < 180.0 {
                    let point = GeoPoint::new(lon, lat);
                    let position = geo_to_pixel(point, zoom);
                    let back = pixel_to_geo(position, zoom);

                    let lon_diff = lon - back.lon;
                    assert!(
                        lon_diff > -1e-9 && lon_diff < 360.0 / xmax + 1e-9,
                        "lon {} at zoom {} came back as {}",
                        lon,
                        zoom,
                        back.lon
                    );

                    // Row y spans [lat(y+1), lat(y)].
                    let north = position_to_lat(position.y, zoom);
                    let south = position_to_lat(position.y + 1, zoom);
                    assert!(
                        lat <= north + 1e-9 && lat >= south - 1e-9,
                        "lat {} at zoom {} outside its pixel row [{}, {}]",
                        lat,
                        zoom,
                        south,
                        north
                    );
                    lon += 17.3;
                }
                lat += 6.1;
            }
        }
    }

    #[test]
    fn test_known_positions() {
        // The map centre is lon 0 / lat 0.
        assert_eq!(geo_to_pixel(GeoPoint::new(0.0, 0.0), 1), MapPosition::new(256, 256));
        let origin = pixel_to_geo(MapPosition::new(0, 0), 3);
        assert_eq!(origin.lon, -180.0);
        assert!((origin.lat - crate::core::constants::MAX_LATITUDE).abs() < 1e-6);
    }

    #[test]
    fn test_monotonic_within_zoom() {
        let zoom = 5;
        let mut last = i64::MIN;
        for step in 0..100 {
            let x = lon_to_position(-179.0 + step as f64 * 3.5, zoom);
            assert!(x >= last);
            last = x;
        }
        let mut last = i64::MIN;
        for step in 0..100 {
            // Latitude decreases while y grows.
            let y = lat_to_position(84.0 - step as f64 * 1.6, zoom);
            assert!(y >= last);
            last = y;
        }
    }

    #[test]
    fn test_tile_variants() {
        assert_eq!(geo_to_tile(GeoPoint::new(6.96, 50.94), 10), (531, 343));
        assert_eq!(tile_to_lon(0, 4), -180.0);
        assert_eq!(tile_to_lon(8, 4), 0.0);
        assert!(tile_to_lat(8, 4).abs() < 1e-9);
        let corner = tile_to_geo(531, 343, 10);
        assert!(corner.lon <= 6.96 && corner.lat >= 50.94);
        assert_eq!(position_to_tile(MapPosition::new(511, 256)), (1, 1));
        assert_eq!(position_to_tile(MapPosition::new(-1, 0)), (-1, 0));
    }

    #[test]
    fn test_checked_projection_rejects_poles() {
        assert!(checked_geo_to_pixel(GeoPoint::new(0.0, 90.0), 4).is_err());
        assert!(checked_geo_to_pixel(GeoPoint::new(0.0, -95.0), 4).is_err());
        assert!(checked_geo_to_pixel(GeoPoint::new(13.4, 52.5), 4).is_ok());
    }
}
