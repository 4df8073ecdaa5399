//! # slippymap
//!
//! The engine beneath a slippy-map widget: Web Mercator projection math, a
//! bounded tile cache, a zoom animation state machine, and a compositor that
//! turns a viewport into a list of tile draw commands.
//!
//! Painting is left to the host toolkit. A [`Map`] is driven from a single UI
//! thread: feed it input, call [`Map::tick`] from a frame timer while an
//! animation runs, and draw the [`Frame`] returned by [`Map::paint`].

pub mod animation;
pub mod core;
pub mod input;
pub mod prelude;
pub mod rendering;
pub mod runtime;
pub mod search;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    config::MapConfig,
    geo::{GeoPoint, MapPosition, ScreenPoint, ScreenSize, TileAddress},
    map::{Diagnostics, Map, MapWarning},
    viewport::ViewState,
};

pub use animation::{AnimationController, AnimationKind, AnimationState, ZoomTransition};

pub use rendering::compositor::{DrawCommand, Frame, RenderStats, ViewportCompositor};

pub use tiles::{
    cache::TileCache,
    loader::{HttpTileLoader, TileFetcher},
    source::{TileServer, TileServerRegistry},
};

pub use search::geocode::{Geocoder, SearchResult};

pub use input::events::InputEvent;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Http(u16),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Unknown tile server index {0}")]
    UnknownServer(usize),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Error type alias for convenience
pub type Error = MapError;
