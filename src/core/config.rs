//! Configuration for the map engine
//!
//! Every tunable of the engine can be set from a JSON document. Missing fields
//! fall back to the defaults in [`crate::core::constants`], so a config file only
//! needs to name what it changes.

use crate::core::constants::{
    ANIMATION_DURATION_MS, ANIMATION_FPS, CACHE_CAPACITY, DEFAULT_GEOCODE_URL, DEFAULT_POSITION,
    DEFAULT_TILE_SERVERS, DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM, SLOW_COMPOSE_THRESHOLD_MS,
};
use crate::core::geo::MapPosition;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Maximum number of decoded tiles kept in memory.
    pub cache_capacity: usize,
    pub animation: AnimationConfig,
    /// When false, zoom requests apply immediately without a transition.
    pub use_animations: bool,
    /// Composite passes slower than this downgrade animated resampling.
    pub slow_compose_threshold_ms: u64,
    /// Tile endpoints in cycling order; the first one starts active.
    pub tile_servers: Vec<TileServerConfig>,
    pub geocode_url: String,
    pub initial_position: MapPosition,
    pub initial_zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            cache_capacity: CACHE_CAPACITY,
            animation: AnimationConfig::default(),
            use_animations: true,
            slow_compose_threshold_ms: SLOW_COMPOSE_THRESHOLD_MS,
            tile_servers: DEFAULT_TILE_SERVERS
                .iter()
                .map(|(url, max_zoom)| TileServerConfig {
                    url: (*url).to_string(),
                    max_zoom: *max_zoom,
                })
                .collect(),
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
            initial_position: MapPosition::new(DEFAULT_POSITION.0, DEFAULT_POSITION.1),
            initial_zoom: DEFAULT_ZOOM,
        }
    }
}

impl MapConfig {
    /// Small cache and no transitions, for constrained hosts.
    pub fn low_resource() -> Self {
        Self {
            cache_capacity: 64,
            use_animations: false,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: MapConfig = serde_json::from_str(json).map_err(MapError::from)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref()).map_err(MapError::from)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self).map_err(MapError::from)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tile_servers.is_empty() {
            return Err(MapError::Config("at least one tile server is required".into()).into());
        }
        if self.cache_capacity == 0 {
            return Err(MapError::Config("cache_capacity must be positive".into()).into());
        }
        if self.animation.fps == 0 {
            return Err(MapError::Config("animation fps must be positive".into()).into());
        }
        if let Some(server) = self
            .tile_servers
            .iter()
            .find(|s| !(MIN_ZOOM..=MAX_ZOOM).contains(&s.max_zoom))
        {
            return Err(MapError::Config(format!(
                "tile server {} has max_zoom {}, expected {}..={}",
                server.url, server.max_zoom, MIN_ZOOM, MAX_ZOOM
            ))
            .into());
        }
        if self.initial_zoom > MAX_ZOOM {
            return Err(MapError::Config(format!(
                "initial_zoom {} is above {}",
                self.initial_zoom, MAX_ZOOM
            ))
            .into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub fps: u32,
    pub duration_ms: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            fps: ANIMATION_FPS,
            duration_ms: ANIMATION_DURATION_MS,
        }
    }
}

impl AnimationConfig {
    /// Delay between two animation ticks.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / self.fps.max(1) as u64)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileServerConfig {
    /// Base URL ending in `/`; tiles are fetched from `{url}{z}/{x}/{y}.png`.
    pub url: String,
    pub max_zoom: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = MapConfig::default();
        assert_eq!(config.cache_capacity, 256);
        assert_eq!(config.animation.fps, 15);
        assert_eq!(config.animation.duration(), Duration::from_millis(500));
        assert_eq!(config.animation.frame_interval(), Duration::from_millis(66));
        assert!(config.use_animations);
        assert!(!config.tile_servers.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MapConfig::from_json_str(
            r#"{
                "cache_capacity": 32,
                "tile_servers": [{ "url": "http://localhost:8080/tiles/", "max_zoom": 12 }],
                "animation": { "fps": 30 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.cache_capacity, 32);
        assert_eq!(config.tile_servers.len(), 1);
        assert_eq!(config.tile_servers[0].max_zoom, 12);
        assert_eq!(config.animation.fps, 30);
        assert_eq!(config.animation.duration_ms, 500);
        assert_eq!(config.initial_zoom, 6);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(MapConfig::from_json_str(r#"{ "tile_servers": [] }"#).is_err());
        assert!(MapConfig::from_json_str(r#"{ "cache_capacity": 0 }"#).is_err());
        assert!(MapConfig::from_json_str(r#"{ "animation": { "fps": 0 } }"#).is_err());
        assert!(MapConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_zoom_above_limit_rejected() {
        let too_deep = MapConfig::from_json_str(
            r#"{ "tile_servers": [{ "url": "https://t/", "max_zoom": 40 }], "initial_zoom": 33 }"#,
        );
        assert!(too_deep.is_err());

        let deep_start = MapConfig::from_json_str(
            r#"{ "tile_servers": [{ "url": "https://t/", "max_zoom": 18 }], "initial_zoom": 64 }"#,
        );
        assert!(deep_start.is_err());

        let at_limit = MapConfig::from_json_str(
            r#"{ "tile_servers": [{ "url": "https://t/", "max_zoom": 30 }], "initial_zoom": 30 }"#,
        )
        .unwrap();
        assert_eq!(at_limit.tile_servers[0].max_zoom, MAX_ZOOM);
        assert!(MapConfig::from_json_str(
            r#"{ "tile_servers": [{ "url": "https://t/", "max_zoom": 0 }] }"#
        )
        .is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let config = MapConfig::low_resource();
        let json = config.to_json_pretty().unwrap();
        assert_eq!(MapConfig::from_json_str(&json).unwrap(), config);
    }
}
