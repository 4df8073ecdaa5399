//! Turns a viewport into tile draw commands.
//!
//! The compositor decides which tiles cover the viewport, looks them up in the
//! cache, asks the fetcher for the missing ones and emits one [`DrawCommand`]
//! per available tile. During a zoom transition the old frame is layered on top
//! of the settled one, followed by the pivot indicator.

use crate::animation::zoom::{Indicator, ZoomTransition};
use crate::core::constants::TILE_SIZE;
use crate::core::geo::{MapPosition, ScreenPoint, ScreenSize};
use crate::core::projection;
use crate::core::viewport::ViewState;
use crate::tiles::cache::{TileCache, TileImage};
use crate::tiles::loader::TileFetcher;
use crate::tiles::source::TileServer;
use std::time::{Duration, Instant};

/// Interpolation used when a layer is drawn scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResamplingQuality {
    #[default]
    Bilinear,
    NearestNeighbor,
}

/// One primitive for the host to draw, in paint order.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Draw `image` with its top-left corner at `(dx, dy)`, then scale the
    /// result by `scale` about `pivot` and blend it with `opacity`.
    Tile {
        image: TileImage,
        dx: i64,
        dy: i64,
        scale: f64,
        pivot: ScreenPoint,
        opacity: f32,
        quality: ResamplingQuality,
    },
    /// Stroke the zoom indicator outline.
    Indicator(Indicator),
}

/// Per-pass counters, reset at the start of every compose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Grid cells visited, over all layers.
    pub tile_count: usize,
    /// Cells that had a cached image to draw.
    pub tiles_drawn: usize,
    /// Cells for which a fetch was requested.
    pub tiles_requested: usize,
    pub compose_time: Duration,
}

/// Result of one compose pass.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub commands: Vec<DrawCommand>,
    pub stats: RenderStats,
}

impl Frame {
    pub fn tiles(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Tile { .. }))
    }

    pub fn indicator(&self) -> Option<&Indicator> {
        self.commands.iter().find_map(|c| match c {
            DrawCommand::Indicator(indicator) => Some(indicator),
            _ => None,
        })
    }
}

/// A cell of the tile grid covering a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    /// Tile index after wraparound. May lie outside the map.
    pub x: i64,
    pub y: i64,
    /// Viewport offset of the tile's top-left corner.
    pub dx: i64,
    pub dy: i64,
}

impl GridCell {
    pub fn in_bounds(&self, zoom: u8) -> bool {
        let n = projection::tile_count(zoom);
        (0..n).contains(&self.x) && (0..n).contains(&self.y)
    }
}

/// Cells covering a `size` viewport whose top-left corner is at `position`,
/// row by row.
///
/// When the right edge runs past the last column, the column range is shifted
/// left so the first columns of the map show up after the last ones.
pub fn tile_grid(position: MapPosition, size: ScreenSize, zoom: u8) -> Vec<GridCell> {
    let n = projection::tile_count(zoom);
    let x0 = position.x.div_euclid(TILE_SIZE);
    let y0 = position.y.div_euclid(TILE_SIZE);
    let x1 = ceil_div(position.x + size.width, TILE_SIZE);
    let y1 = ceil_div(position.y + size.height, TILE_SIZE);

    let shift = if x1 > n { n - x1 } else { 0 };

    let mut cells = Vec::with_capacity(((x1 - x0).max(0) * (y1 - y0).max(0)) as usize);
    let mut dy = y0 * TILE_SIZE - position.y;
    for y in y0..y1 {
        let mut dx = x0 * TILE_SIZE - position.x;
        for x in (x0 + shift)..(x1 + shift) {
            cells.push(GridCell {
                x: (x - shift) % n,
                y,
                dx,
                dy,
            });
            dx += TILE_SIZE;
        }
        dy += TILE_SIZE;
    }
    cells
}

fn ceil_div(a: i64, b: i64) -> i64 {
    -((-a).div_euclid(b))
}

/// How one layer of tiles is placed on screen.
struct Layer {
    zoom: u8,
    position: MapPosition,
    scale: f64,
    pivot: ScreenPoint,
    opacity: f32,
}

/// Builds [`Frame`]s and keeps track of render quality between passes.
#[derive(Debug, Clone)]
pub struct ViewportCompositor {
    quality: ResamplingQuality,
    slow_threshold: Duration,
    use_animations: bool,
    stats: RenderStats,
}

impl ViewportCompositor {
    pub fn new(slow_threshold: Duration, use_animations: bool) -> Self {
        Self {
            quality: ResamplingQuality::Bilinear,
            slow_threshold,
            use_animations,
            stats: RenderStats::default(),
        }
    }

    pub fn quality(&self) -> ResamplingQuality {
        self.quality
    }

    pub fn set_use_animations(&mut self, enabled: bool) {
        self.use_animations = enabled;
    }

    /// Stats of the last pass.
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Composes the frame for `view`. `transition` carries the running zoom
    /// transition and its current factor.
    pub fn compose(
        &mut self,
        view: &ViewState,
        transition: Option<(&ZoomTransition, f64)>,
        server: &TileServer,
        cache: &mut TileCache,
        fetcher: &mut dyn TileFetcher,
    ) -> Frame {
        let started = Instant::now();
        self.stats = RenderStats::default();
        let mut commands = Vec::new();
        let size = view.size();

        let settled = Layer {
            zoom: view.zoom(),
            position: view.map_position(),
            scale: 1.0,
            pivot: ScreenPoint::default(),
            opacity: 1.0,
        };
        self.paint_layer(&mut commands, &settled, size, server, cache, fetcher);

        if let Some((transition, factor)) = transition {
            let old = Layer {
                zoom: transition.source_zoom(view.zoom()),
                position: transition.position,
                scale: transition.scale_at(factor),
                pivot: transition.pivot,
                opacity: transition.opacity_at(factor),
            };
            self.paint_layer(&mut commands, &old, size, server, cache, fetcher);
            commands.push(DrawCommand::Indicator(transition.indicator_at(factor)));
        }

        self.record_compose_time(started.elapsed());
        Frame {
            commands,
            stats: self.stats,
        }
    }

    fn paint_layer(
        &mut self,
        commands: &mut Vec<DrawCommand>,
        layer: &Layer,
        size: ScreenSize,
        server: &TileServer,
        cache: &mut TileCache,
        fetcher: &mut dyn TileFetcher,
    ) {
        for cell in tile_grid(layer.position, size, layer.zoom) {
            self.stats.tile_count += 1;
            if !cell.in_bounds(layer.zoom) {
                continue;
            }
            let (x, y) = (cell.x as u32, cell.y as u32);
            let address = server.address(x, y, layer.zoom);
            match cache.get(&address) {
                Some(image) => {
                    self.stats.tiles_drawn += 1;
                    commands.push(DrawCommand::Tile {
                        image,
                        dx: cell.dx,
                        dy: cell.dy,
                        scale: layer.scale,
                        pivot: layer.pivot,
                        opacity: layer.opacity,
                        quality: self.quality,
                    });
                }
                None => {
                    self.stats.tiles_requested += 1;
                    fetcher.request(address, server.tile_url(x, y, layer.zoom));
                }
            }
        }
    }

    /// Stores the pass duration and drops to nearest-neighbour resampling once a
    /// pass turns out too slow while animations are on.
    pub(crate) fn record_compose_time(&mut self, elapsed: Duration) {
        self.stats.compose_time = elapsed;
        if elapsed > self.slow_threshold
            && self.use_animations
            && self.quality != ResamplingQuality::NearestNeighbor
        {
            log::info!(
                "compose took {} ms, switching to nearest-neighbour resampling",
                elapsed.as_millis()
            );
            self.quality = ResamplingQuality::NearestNeighbor;
        }
    }
}
