//! Core constants taken from the classic OpenStreetMap slippy-map conventions.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Square tile size in pixels.
pub const TILE_SIZE: i64 = 256;

/// Default number of decoded tiles kept in memory.
pub const CACHE_CAPACITY: usize = 256;

/// Timer rate driving zoom animations.
pub const ANIMATION_FPS: u32 = 15;

/// Length of one zoom animation.
pub const ANIMATION_DURATION_MS: u64 = 500;

/// A composite pass slower than this downgrades animated resampling.
pub const SLOW_COMPOSE_THRESHOLD_MS: u64 = 500;

/// Zoom used for a search result whose own zoom is out of range.
pub const DEFAULT_SEARCH_ZOOM: u8 = 8;

/// Pixels moved by one arrow-key pan.
pub const MOVE_STEP: i64 = 32;

/// Lowest zoom level a view may reach.
pub const MIN_ZOOM: u8 = 1;

/// Highest zoom any server or view may use. Map space at this zoom still fits
/// an `i64` after squaring the tile count.
pub const MAX_ZOOM: u8 = 30;

/// Latitude limit of the Web Mercator square.
pub const MAX_LATITUDE: f64 = 85.0511287798;

/// Tile fetched to decide whether a server is alive.
pub const PROBE_TILE: (u32, u32, u8) = (1, 1, 1);

/// Side length and shading of the zoom indicator rectangle drawn at the pivot.
pub const INDICATOR_SIZE: (i64, i64) = (80, 60);
pub const INDICATOR_BASE_SHADE: u8 = 0x80;
pub const INDICATOR_SHADE_RANGE: f64 = 0x60 as f64;

/// Default start view: central Europe at zoom 6.
pub const DEFAULT_POSITION: (i64, i64) = (8282, 5179);
pub const DEFAULT_ZOOM: u8 = 6;

/// Public endpoints used when no configuration is supplied.
pub const DEFAULT_TILE_SERVERS: &[(&str, u8)] = &[
    ("https://tile.openstreetmap.org/", 18),
    ("https://tile.openstreetmap.de/", 18),
];

pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org/search";
