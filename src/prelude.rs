//! Prelude module for common slippymap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use slippymap::prelude::*;`

pub use crate::core::{
    config::{AnimationConfig, MapConfig, TileServerConfig},
    geo::{GeoPoint, MapPosition, ScreenPoint, ScreenSize, TileAddress},
    map::{Diagnostics, Map, MapWarning},
    projection,
    viewport::ViewState,
};

pub use crate::animation::{AnimationController, AnimationKind, AnimationState, ZoomTransition};

pub use crate::input::{
    events::{InputEvent, KeyCode, MouseButton},
    handler::{Action, InputHandler},
};

pub use crate::rendering::compositor::{
    DrawCommand, Frame, RenderStats, ResamplingQuality, ViewportCompositor,
};

pub use crate::runtime::{AsyncSpawner, SharedSpawner};

pub use crate::search::{Geocoder, NominatimGeocoder, SearchResult};

pub use crate::tiles::{
    cache::{TileCache, TileImage},
    loader::{HttpTileLoader, TileFetcher},
    source::{HttpProbe, TileProbe, TileServer, TileServerRegistry},
};

pub use crate::{Error as MapError, Result};

pub use std::{
    sync::Arc,
    time::{Duration, Instant},
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
