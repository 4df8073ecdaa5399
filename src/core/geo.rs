use crate::core::constants::MAX_LATITUDE;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A geographical coordinate in degrees, longitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// True when the latitude can be projected to a finite Web Mercator y.
    pub fn is_projectable(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite() && self.lat.abs() < 90.0
    }

    /// Same point with the latitude pulled inside the Web Mercator square.
    pub fn clamped(&self) -> Self {
        Self::new(self.lon, self.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE))
    }
}

impl Default for GeoPoint {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Integer pixel coordinate in map space at some zoom level.
///
/// Map space spans `[0, 256·2^zoom)` on both axes. The zoom is not stored here;
/// a position is only meaningful together with the zoom of the view holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MapPosition {
    pub x: i64,
    pub y: i64,
}

impl MapPosition {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: i64, dy: i64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Pixel coordinate relative to the top-left corner of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i64,
    pub y: i64,
}

impl ScreenPoint {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Viewport dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: i64,
    pub height: i64,
}

impl ScreenSize {
    pub fn new(width: i64, height: i64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.width / 2, self.height / 2)
    }
}

/// Identifies one tile of one server. Used purely as a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileAddress {
    server: String,
    x: u32,
    y: u32,
    zoom: u8,
}

impl TileAddress {
    pub fn new(server: impl Into<String>, x: u32, y: u32, zoom: u8) -> Self {
        Self {
            server: server.into(),
            x,
            y,
            zoom,
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}/{}", self.server, self.zoom, self.x, self.y)
    }
}
