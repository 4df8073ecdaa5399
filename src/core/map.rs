use crate::{
    animation::{AnimationController, AnimationKind, ZoomTransition},
    core::{
        config::MapConfig,
        constants::{DEFAULT_SEARCH_ZOOM, MIN_ZOOM},
        geo::{GeoPoint, MapPosition, ScreenPoint, ScreenSize},
        projection,
        viewport::ViewState,
    },
    input::{Action, InputEvent, InputHandler},
    rendering::compositor::{Frame, RenderStats, ViewportCompositor},
    runtime::SharedSpawner,
    search::SearchResult,
    tiles::{
        cache::TileCache,
        loader::{HttpTileLoader, TileFetcher},
        source::{ServerUnreachable, TileProbe, TileServerRegistry},
    },
    MapError, Result,
};
use std::fmt;
use std::time::{Duration, Instant};

/// Conditions the host should tell the user about. None of them stop the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapWarning {
    ServerUnreachable(ServerUnreachable),
}

impl fmt::Display for MapWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapWarning::ServerUnreachable(inner) => inner.fmt(f),
        }
    }
}

/// The map engine behind one widget.
///
/// Everything here runs on the UI thread. Tile downloads happen on the async
/// runtime behind the fetcher and are picked up at the start of each paint.
pub struct Map {
    config: MapConfig,
    view: ViewState,
    registry: TileServerRegistry,
    cache: TileCache,
    fetcher: Box<dyn TileFetcher + Send>,
    animation: AnimationController,
    transition: Option<ZoomTransition>,
    compositor: ViewportCompositor,
    input: InputHandler,
}

impl Map {
    pub fn new(
        config: MapConfig,
        size: ScreenSize,
        fetcher: Box<dyn TileFetcher + Send>,
    ) -> Result<Self> {
        config.validate()?;
        let registry = TileServerRegistry::from_config(&config.tile_servers)?;
        let view = ViewState::new(
            config.initial_position,
            config.initial_zoom,
            registry.active().max_zoom(),
            size,
        );
        let compositor = ViewportCompositor::new(
            Duration::from_millis(config.slow_compose_threshold_ms),
            config.use_animations,
        );
        log::info!(
            "map ready at zoom {} on {}",
            view.zoom(),
            registry.active().url()
        );

        Ok(Self {
            cache: TileCache::new(config.cache_capacity),
            config,
            view,
            registry,
            fetcher,
            animation: AnimationController::new(),
            transition: None,
            compositor,
            input: InputHandler::new(),
        })
    }

    /// Map whose tiles are downloaded over HTTP on `spawner`.
    pub fn with_http_loader(
        config: MapConfig,
        size: ScreenSize,
        spawner: SharedSpawner,
    ) -> Result<Self> {
        Self::new(config, size, Box::new(HttpTileLoader::new(spawner)))
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn registry(&self) -> &TileServerRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn input_handler_mut(&mut self) -> &mut InputHandler {
        &mut self.input
    }

    pub fn zoom(&self) -> u8 {
        self.view.zoom()
    }

    /// Stats of the last paint.
    pub fn stats(&self) -> RenderStats {
        self.compositor.stats()
    }

    /// True from the start of an animated zoom until its last frame.
    pub fn is_in_transition(&self) -> bool {
        self.transition.is_some()
    }

    pub fn use_animations(&self) -> bool {
        self.config.use_animations
    }

    pub fn set_use_animations(&mut self, enabled: bool) {
        self.config.use_animations = enabled;
        self.compositor.set_use_animations(enabled);
    }

    pub fn resize(&mut self, size: ScreenSize) {
        self.view.set_size(size);
    }

    /// Frame rate at which the host should call [`tick`](Self::tick).
    pub fn frame_interval(&self) -> Duration {
        self.config.animation.frame_interval()
    }

    pub fn set_map_position(&mut self, position: MapPosition) {
        self.view.set_map_position(position);
    }

    pub fn set_center(&mut self, point: GeoPoint) -> Result<()> {
        let center = projection::checked_geo_to_pixel(point, self.view.zoom())?;
        self.view.set_center_position(center);
        Ok(())
    }

    /// Zooms in immediately. Returns false at the maximum zoom.
    pub fn zoom_in(&mut self, pivot: ScreenPoint) -> bool {
        self.cancel_animation();
        self.view.zoom_in(pivot)
    }

    /// Zooms out immediately. Returns false at zoom 1.
    pub fn zoom_out(&mut self, pivot: ScreenPoint) -> bool {
        self.cancel_animation();
        self.view.zoom_out(pivot)
    }

    /// Zooms in with a transition. Ignored while another zoom animation runs;
    /// applied immediately when animations are off.
    pub fn zoom_in_animated(&mut self, pivot: ScreenPoint, now: Instant) -> bool {
        if !self.config.use_animations {
            return self.zoom_in(pivot);
        }
        if !self.view.can_zoom_in() {
            return false;
        }
        self.start_zoom(AnimationKind::ZoomIn, pivot, now)
    }

    /// Zooms out with a transition. Same rules as [`zoom_in_animated`](Self::zoom_in_animated).
    pub fn zoom_out_animated(&mut self, pivot: ScreenPoint, now: Instant) -> bool {
        if !self.config.use_animations {
            return self.zoom_out(pivot);
        }
        if !self.view.can_zoom_out() {
            return false;
        }
        self.start_zoom(AnimationKind::ZoomOut, pivot, now)
    }

    fn start_zoom(&mut self, kind: AnimationKind, pivot: ScreenPoint, now: Instant) -> bool {
        if self.animation.is_running() {
            return false;
        }
        self.input.clear_drag();
        let transition = ZoomTransition::new(kind, self.view.map_position(), pivot);
        match kind {
            AnimationKind::ZoomIn => self.view.zoom_in(pivot),
            AnimationKind::ZoomOut => self.view.zoom_out(pivot),
        };
        self.animation
            .start(kind, self.config.animation.duration(), now);
        self.transition = Some(transition);
        true
    }

    fn cancel_animation(&mut self) {
        self.animation.cancel();
        self.transition = None;
    }

    /// Advances a running zoom animation. Returns true when the host should
    /// repaint.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.animation.is_running() {
            return false;
        }
        let mut completed = false;
        self.animation.tick(
            now,
            |factor| log::trace!("zoom frame at {:.2}", factor),
            || completed = true,
        );
        if completed {
            self.transition = None;
        }
        true
    }

    /// Builds the frame to draw. Stores finished downloads first, then
    /// requests whatever the viewport still misses.
    pub fn paint(&mut self, now: Instant) -> Frame {
        self.tick(now);
        for (address, image) in self.fetcher.poll_completed() {
            self.cache.put(address, image);
        }

        let transition = self
            .transition
            .as_ref()
            .map(|t| (t, self.animation.factor()));
        self.compositor.compose(
            &self.view,
            transition,
            self.registry.active(),
            &mut self.cache,
            self.fetcher.as_mut(),
        )
    }

    /// Switches to another tile server, zooming out until the view fits its
    /// zoom range. Returns a warning when that server failed its probe.
    pub fn set_tile_server(&mut self, index: usize) -> Result<Option<MapWarning>> {
        if index < self.registry.len() && index == self.registry.active_index() {
            return Ok(None);
        }
        let warning = self.registry.activate(index)?;
        self.cancel_animation();
        let steps = self.view.set_max_zoom(self.registry.active().max_zoom());
        if steps > 0 {
            log::info!("zoomed out {} levels to {}", steps, self.view.zoom());
        }
        Ok(warning.map(MapWarning::ServerUnreachable))
    }

    /// Activates the server after the current one, wrapping around.
    pub fn next_tile_server(&mut self) -> Option<MapWarning> {
        let current = self.registry.active().url().to_string();
        let index = self.registry.next_index(&current)?;
        match self.set_tile_server(index) {
            Ok(warning) => warning,
            Err(e) => {
                log::error!("failed to switch tile server: {}", e);
                None
            }
        }
    }

    /// Probes every server and returns the warning owed for the active one.
    pub async fn probe_servers(&mut self, prober: &dyn TileProbe) -> Option<MapWarning> {
        let results = self.registry.probe_all(prober).await;
        log::info!(
            "{} of {} tile servers reachable",
            results.iter().filter(|ok| **ok).count(),
            results.len()
        );
        self.registry
            .check_active()
            .map(MapWarning::ServerUnreachable)
    }

    /// Centres the view on a search result. The result's zoom is used only when
    /// the active server supports it.
    pub fn show_search_result(&mut self, result: &SearchResult) -> Result<()> {
        let point = result.geo();
        if !point.is_projectable() {
            return Err(MapError::InvalidCoordinates(format!(
                "{} at lon {}, lat {}",
                result.name, point.lon, point.lat
            ))
            .into());
        }
        let max_zoom = self.view.max_zoom();
        let zoom = u8::try_from(result.zoom)
            .ok()
            .filter(|z| (MIN_ZOOM..=max_zoom).contains(z))
            .unwrap_or(DEFAULT_SEARCH_ZOOM);

        self.cancel_animation();
        self.view.set_zoom(zoom);
        self.set_center(point.clamped())?;
        log::info!("showing {} at zoom {}", result.name, self.view.zoom());
        Ok(())
    }

    /// Feeds one input event. Returns true when the view changed.
    pub fn handle_input(&mut self, event: &InputEvent, now: Instant) -> bool {
        let actions =
            self.input
                .handle_event(event, self.view.map_position(), self.view.size());
        let changed = !actions.is_empty();
        for action in actions {
            self.apply(action, now);
        }
        changed
    }

    fn apply(&mut self, action: Action, now: Instant) {
        match action {
            Action::MoveTo(position) => self.view.set_map_position(position),
            Action::Pan { dx, dy } => self.view.translate(dx, dy),
            Action::ZoomIn {
                pivot,
                animate: true,
            } => {
                self.zoom_in_animated(pivot, now);
            }
            Action::ZoomIn {
                pivot,
                animate: false,
            } => {
                self.zoom_in(pivot);
            }
            Action::ZoomOut {
                pivot,
                animate: true,
            } => {
                self.zoom_out_animated(pivot, now);
            }
            Action::ZoomOut {
                pivot,
                animate: false,
            } => {
                self.zoom_out(pivot);
            }
            Action::Recenter(screen) => {
                let center = self.view.to_map_position(screen);
                self.view.set_center_position(center);
            }
            Action::Resize(size) => self.resize(size),
        }
    }

    pub fn cursor(&self) -> ScreenPoint {
        self.input.cursor()
    }

    /// Snapshot of the numbers shown in a debug overlay.
    pub fn diagnostics(&self) -> Diagnostics {
        let cursor = self.input.cursor();
        let stats = self.compositor.stats();
        let zoom = self.view.zoom();
        let (tile_x, tile_y) = self.view.tile_at(cursor);
        Diagnostics {
            zoom,
            map_size: self.view.map_size(),
            position: self.view.map_position(),
            cursor: self.view.to_map_position(cursor),
            center: self.view.center_position(),
            tile_count: self.view.tile_count(),
            painted_tiles: stats.tile_count,
            paint_time: stats.compose_time,
            active_tile: (tile_x, tile_y),
            tile_box: GeoPoint::new(
                projection::tile_to_lon(tile_x, zoom),
                projection::tile_to_lat(tile_y, zoom),
            ),
            cursor_geo: self.view.geo_at(cursor),
            cache_len: self.cache.len(),
            cache_capacity: self.cache.capacity(),
        }
    }
}

/// Numbers for a debug overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostics {
    pub zoom: u8,
    pub map_size: i64,
    pub position: MapPosition,
    /// Map-space pixel under the cursor
    pub cursor: MapPosition,
    pub center: MapPosition,
    /// Tiles along one axis
    pub tile_count: i64,
    pub painted_tiles: usize,
    pub paint_time: Duration,
    pub active_tile: (i64, i64),
    /// North-west corner of the tile under the cursor
    pub tile_box: GeoPoint,
    pub cursor_geo: GeoPoint,
    pub cache_len: usize,
    pub cache_capacity: usize,
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.tile_count.saturating_mul(self.tile_count);
        let rows = [
            ("Zoom", self.zoom.to_string()),
            ("MapSize", format!("{}, {}", self.map_size, self.map_size)),
            (
                "MapPosition",
                format!("{}, {}", self.position.x, self.position.y),
            ),
            (
                "CursorPosition",
                format!("{}, {}", self.cursor.x, self.cursor.y),
            ),
            (
                "CenterPosition",
                format!("{}, {}", self.center.x, self.center.y),
            ),
            (
                "Tilescount",
                format!("{}, {} ({} total)", self.tile_count, self.tile_count, total),
            ),
            ("Painted-Tilescount", self.painted_tiles.to_string()),
            ("Paint-Time", format!("{} ms.", self.paint_time.as_millis())),
            (
                "Active Tile",
                format!("{}, {}", self.active_tile.0, self.active_tile.1),
            ),
            (
                "Tile Box Lon/Lat",
                format!("{:.5}, {:.5}", self.tile_box.lon, self.tile_box.lat),
            ),
            (
                "Cursor Lon/Lat",
                format!("{:.5}, {:.5}", self.cursor_geo.lon, self.cursor_geo.lat),
            ),
            (
                "Tilecache",
                format!("{:3} / {:3}", self.cache_len, self.cache_capacity),
            ),
        ];
        for (key, value) in rows {
            writeln!(f, "{:<20}{}", key, value)?;
        }
        Ok(())
    }
}
