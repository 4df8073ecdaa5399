use crate::core::constants::{MAX_ZOOM, MIN_ZOOM};
use crate::core::geo::{GeoPoint, MapPosition, ScreenPoint, ScreenSize};
use crate::core::projection;

/// Position, zoom and size of the visible part of the map.
///
/// `position` is the map-space pixel at the top-left corner of the viewport.
/// The map size is always derived from the zoom, so it can never go stale.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    zoom: u8,
    max_zoom: u8,
    position: MapPosition,
    size: ScreenSize,
}

impl ViewState {
    pub fn new(position: MapPosition, zoom: u8, max_zoom: u8, size: ScreenSize) -> Self {
        let max_zoom = max_zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        let mut view = Self {
            zoom: zoom.clamp(MIN_ZOOM, max_zoom),
            max_zoom,
            position: MapPosition::default(),
            size,
        };
        view.set_map_position(position);
        view
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    pub fn map_position(&self) -> MapPosition {
        self.position
    }

    pub fn size(&self) -> ScreenSize {
        self.size
    }

    pub fn set_size(&mut self, size: ScreenSize) {
        self.size = size;
    }

    pub fn tile_count(&self) -> i64 {
        projection::tile_count(self.zoom)
    }

    /// Width and height of the whole map at the current zoom.
    pub fn map_size(&self) -> i64 {
        projection::map_size(self.zoom)
    }

    /// Sets the zoom without moving the position, clamped to `1..=max_zoom`.
    pub fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom.clamp(MIN_ZOOM, self.max_zoom);
    }

    /// Moves the viewport; x wraps once around the map width, y is kept as given.
    pub fn set_map_position(&mut self, position: MapPosition) {
        let xmax = self.map_size();
        let x = if position.x > xmax {
            position.x - xmax
        } else if position.x < 0 {
            position.x + xmax
        } else {
            position.x
        };
        self.position = MapPosition::new(x, position.y);
    }

    pub fn translate(&mut self, dx: i64, dy: i64) {
        self.set_map_position(self.position.offset(dx, dy));
    }

    /// Map-space pixel at the viewport centre.
    pub fn center_position(&self) -> MapPosition {
        let center = self.size.center();
        self.position.offset(center.x, center.y)
    }

    pub fn set_center_position(&mut self, center: MapPosition) {
        let half = self.size.center();
        self.set_map_position(center.offset(-half.x, -half.y));
    }

    /// Map-space pixel under a viewport point.
    pub fn to_map_position(&self, screen: ScreenPoint) -> MapPosition {
        self.position.offset(screen.x, screen.y)
    }

    /// Viewport point at which a geographic coordinate is drawn.
    pub fn screen_coordinates(&self, point: GeoPoint) -> ScreenPoint {
        let position = projection::geo_to_pixel(point, self.zoom);
        ScreenPoint::new(position.x - self.position.x, position.y - self.position.y)
    }

    pub fn geo_at(&self, screen: ScreenPoint) -> GeoPoint {
        projection::pixel_to_geo(self.to_map_position(screen), self.zoom)
    }

    pub fn tile_at(&self, screen: ScreenPoint) -> (i64, i64) {
        projection::position_to_tile(self.to_map_position(screen))
    }

    pub fn can_zoom_in(&self) -> bool {
        self.zoom < self.max_zoom
    }

    pub fn can_zoom_out(&self) -> bool {
        self.zoom > MIN_ZOOM
    }

    /// Goes one level deeper keeping the map point under `pivot` in place.
    /// Returns false at the maximum zoom.
    pub fn zoom_in(&mut self, pivot: ScreenPoint) -> bool {
        if !self.can_zoom_in() {
            return false;
        }
        let old = self.position;
        self.zoom += 1;
        self.set_map_position(MapPosition::new(old.x * 2 + pivot.x, old.y * 2 + pivot.y));
        true
    }

    /// Goes one level up keeping the map point under `pivot` in place.
    /// Returns false at zoom 1.
    pub fn zoom_out(&mut self, pivot: ScreenPoint) -> bool {
        if !self.can_zoom_out() {
            return false;
        }
        let old = self.position;
        self.zoom -= 1;
        self.set_map_position(MapPosition::new(
            (old.x - pivot.x) / 2,
            (old.y - pivot.y) / 2,
        ));
        true
    }

    /// Adopts the zoom limit of a newly active server, zooming out one level at a
    /// time around the viewport centre until the view complies.
    pub fn set_max_zoom(&mut self, max_zoom: u8) -> u32 {
        let max_zoom = max_zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        let mut steps = 0;
        while self.zoom > max_zoom {
            let center = self.size.center();
            self.zoom_out(center);
            steps += 1;
        }
        self.max_zoom = max_zoom;
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(x: i64, y: i64, zoom: u8) -> ViewState {
        ViewState::new(MapPosition::new(x, y), zoom, 18, ScreenSize::new(800, 600))
    }

    #[test]
    fn test_zoom_limit_is_capped() {
        let mut view = ViewState::new(MapPosition::new(0, 0), 64, 70, ScreenSize::new(800, 600));
        assert_eq!(view.max_zoom(), 30);
        assert_eq!(view.zoom(), 30);
        assert!(!view.zoom_in(ScreenPoint::new(400, 300)));
        assert!(view.map_size() > 0);

        assert_eq!(view.set_max_zoom(200), 0);
        assert_eq!(view.max_zoom(), 30);
    }

    #[test]
    fn test_map_size_follows_zoom() {
        let mut view = view(0, 0, 3);
        assert_eq!(view.map_size(), 2048);
        view.set_zoom(5);
        assert_eq!(view.map_size(), 8192);
        assert_eq!(view.tile_count(), 32);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut view = view(0, 0, 3);
        view.set_zoom(0);
        assert_eq!(view.zoom(), 1);
        view.set_zoom(30);
        assert_eq!(view.zoom(), 18);
    }

    #[test]
    fn test_x_wraps_once_y_does_not() {
        // zoom 2: map width 1024
        let mut view = view(0, 0, 2);
        view.set_map_position(MapPosition::new(1100, -50));
        assert_eq!(view.map_position(), MapPosition::new(76, -50));
        view.set_map_position(MapPosition::new(-24, 2000));
        assert_eq!(view.map_position(), MapPosition::new(1000, 2000));
        view.set_map_position(MapPosition::new(1024, 0));
        assert_eq!(view.map_position(), MapPosition::new(1024, 0));
        view.translate(10, 0);
        assert_eq!(view.map_position(), MapPosition::new(10, 0));
    }

    #[test]
    fn test_zoom_in_and_out_keep_pivot() {
        let mut view = view(1000, 700, 4);
        let pivot = ScreenPoint::new(100, 50);
        let before = view.to_map_position(pivot);

        assert!(view.zoom_in(pivot));
        assert_eq!(view.zoom(), 5);
        assert_eq!(view.map_position(), MapPosition::new(2100, 1450));
        let after = view.to_map_position(pivot);
        assert_eq!((after.x, after.y), (before.x * 2, before.y * 2));

        assert!(view.zoom_out(pivot));
        assert_eq!(view.zoom(), 4);
        assert_eq!(view.map_position(), MapPosition::new(1000, 700));
    }

    #[test]
    fn test_zoom_limits_are_noops() {
        let mut view = view(10, 10, 1);
        assert!(!view.zoom_out(ScreenPoint::new(0, 0)));
        assert_eq!(view.zoom(), 1);
        view.set_zoom(18);
        let position = view.map_position();
        assert!(!view.zoom_in(ScreenPoint::new(0, 0)));
        assert_eq!(view.map_position(), position);
    }

    #[test]
    fn test_lower_max_zoom_steps_out_around_center() {
        let mut view = view(2_000_000, 1_500_000, 14);
        let center = view.size().center();
        let mut expected = view.map_position();
        for _ in 0..4 {
            expected = MapPosition::new((expected.x - center.x) / 2, (expected.y - center.y) / 2);
        }

        assert_eq!(view.set_max_zoom(10), 4);
        assert_eq!(view.zoom(), 10);
        assert_eq!(view.max_zoom(), 10);
        assert_eq!(view.map_position(), expected);
    }

    #[test]
    fn test_center_round_trip() {
        let mut view = view(0, 0, 6);
        view.set_center_position(MapPosition::new(8682, 5479));
        assert_eq!(view.map_position(), MapPosition::new(8282, 5179));
        assert_eq!(view.center_position(), MapPosition::new(8682, 5479));
    }

    #[test]
    fn test_screen_coordinates_of_geo_point() {
        let view = view(8282, 5179, 6);
        let screen = ScreenPoint::new(123, 77);
        let geo = view.geo_at(screen);
        let back = view.screen_coordinates(geo);
        assert!((back.x - screen.x).abs() <= 1);
        assert!((back.y - screen.y).abs() <= 1);
    }
}
