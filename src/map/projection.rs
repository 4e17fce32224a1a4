//! Spherical Web-Mercator projection for 256-px tile pyramids.
//!
//! World pixel coordinates at zoom `z` span `0..256·2^z` on both axes,
//! origin top-left (lng -180, lat +85.05).

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::location::Coordinate;

pub const TILE_SIZE: f64 = 256.0;

/// Latitude at which the Mercator square ends.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// A position inside the map container, in CSS-style pixels from the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A container with a zero dimension has not been laid out yet.
    pub fn is_measurable(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Center and zoom of the visible map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: Coordinate,
    pub zoom: u8,
}

fn world_size(zoom: u8) -> f64 {
    TILE_SIZE * 2f64.powi(i32::from(zoom))
}

/// Coordinate → world pixel.
pub fn project(c: Coordinate, zoom: u8) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = c.lat().clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (c.lng() + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    (x, y)
}

/// World pixel → coordinate. Longitude wraps into [-180, 180), latitude
/// is clamped to the Mercator limit.
pub fn unproject(x: f64, y: f64, zoom: u8) -> Coordinate {
    let size = world_size(zoom);
    let lng = (x / size * 360.0 + 180.0).rem_euclid(360.0) - 180.0;
    let n = PI * (1.0 - 2.0 * y / size);
    let lat = n.sinh().atan().to_degrees();
    Coordinate::clamped(lat.clamp(-MAX_LATITUDE, MAX_LATITUDE), lng)
}

/// Translate a click inside the container into the coordinate under it.
pub fn screen_to_coordinate(view: &MapView, viewport: ViewportSize, point: ScreenPoint) -> Coordinate {
    let (cx, cy) = project(view.center, view.zoom);
    let x = cx + point.x - f64::from(viewport.width) / 2.0;
    let y = cy + point.y - f64::from(viewport.height) / 2.0;
    unproject(x, y, view.zoom)
}

/// Slippy-map tile `(x, y)` containing `c` at `zoom`.
pub fn tile_index(c: Coordinate, zoom: u8) -> (u32, u32) {
    let (x, y) = project(c, zoom);
    let max = 1u64
        .checked_shl(u32::from(zoom))
        .map_or(u64::MAX, |tiles| tiles - 1)
        .min(u64::from(u32::MAX));
    let to_index = |v: f64| ((v / TILE_SIZE).floor().max(0.0) as u64).min(max) as u32;
    (to_index(x), to_index(y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn test_origin_projects_to_world_center() {
        let (x, y) = project(coord(0.0, 0.0), 0);
        assert_abs_diff_eq!(x, 128.0, epsilon = 1e-9);
        assert_abs_diff_eq!(y, 128.0, epsilon = 1e-9);
    }

    #[test]
    fn test_project_unproject_round_trip() {
        let sf = coord(37.7749, -122.4194);
        let (x, y) = project(sf, 18);
        let back = unproject(x, y, 18);
        assert_abs_diff_eq!(back.lat(), sf.lat(), epsilon = 1e-9);
        assert_abs_diff_eq!(back.lng(), sf.lng(), epsilon = 1e-9);
    }

    #[test]
    fn test_click_at_viewport_center_is_view_center() {
        let view = MapView { center: coord(59.3293, 18.0686), zoom: 12 };
        let c = screen_to_coordinate(&view, ViewportSize::new(800, 600), ScreenPoint::new(400.0, 300.0));
        assert_abs_diff_eq!(c.lat(), 59.3293, epsilon = 1e-9);
        assert_abs_diff_eq!(c.lng(), 18.0686, epsilon = 1e-9);
    }

    #[test]
    fn test_click_directions() {
        let view = MapView { center: coord(0.0, 0.0), zoom: 4 };
        let vp = ViewportSize::new(400, 400);
        let right_up = screen_to_coordinate(&view, vp, ScreenPoint::new(300.0, 100.0));
        assert!(right_up.lng() > 0.0);
        assert!(right_up.lat() > 0.0);
    }

    #[test]
    fn test_longitude_wraps_across_antimeridian() {
        let view = MapView { center: coord(0.0, 179.9), zoom: 10 };
        let c = screen_to_coordinate(&view, ViewportSize::new(1000, 100), ScreenPoint::new(1000.0, 50.0));
        assert!(c.lng() < 0.0);
        assert!(c.lng() >= -180.0);
    }

    #[test]
    fn test_latitude_clamped_at_mercator_limit() {
        let c = unproject(128.0, -10_000.0, 0);
        assert_abs_diff_eq!(c.lat(), MAX_LATITUDE, epsilon = 1e-9);
    }

    #[test]
    fn test_tile_index() {
        assert_eq!(tile_index(coord(0.0, 0.0), 1), (1, 1));
        assert_eq!(tile_index(coord(85.0, -180.0), 3), (0, 0));
        assert_eq!(tile_index(coord(-85.0, 180.0), 3), (7, 7));
    }

    #[test]
    fn test_tile_index_extreme_zoom_saturates() {
        assert_eq!(tile_index(coord(-85.0, 180.0), 70), (u32::MAX, u32::MAX));
        assert_eq!(tile_index(coord(0.0, -180.0), u8::MAX).0, 0);
    }
}
