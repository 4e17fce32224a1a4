//! Map lifecycle and the single-marker rule.

use tracing::{debug, warn};

use super::projection::{screen_to_coordinate, MapView, ScreenPoint, ViewportSize};
use super::surface::{MapOptions, MapSurface, MarkerIcon, MarkerId};
use crate::location::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Mounted, waiting for the container to report a measurable size.
    AwaitingLayout,
    Active,
    Released,
}

/// The selected position and the surface marker currently drawing it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MarkerState {
    pub position: Option<Coordinate>,
    rendered: Option<MarkerId>,
}

/// Owns a `MapSurface` and enforces: one creation per mounted lifetime,
/// at most one rendered marker, full release on teardown.
pub struct MapController<S: MapSurface> {
    surface: S,
    options: MapOptions,
    icon: MarkerIcon,
    lifecycle: Lifecycle,
    viewport: ViewportSize,
    view: MapView,
    marker: MarkerState,
}

impl<S: MapSurface> MapController<S> {
    pub fn new(surface: S, options: MapOptions, icon: MarkerIcon) -> Self {
        let view = MapView {
            center: options.center,
            zoom: options.zoom.min(options.max_zoom),
        };
        Self {
            surface,
            options,
            icon,
            lifecycle: Lifecycle::AwaitingLayout,
            viewport: ViewportSize::default(),
            view,
            marker: MarkerState::default(),
        }
    }

    /// Layout signal from the container. The first measurable size creates
    /// the surface; later calls only resize it. Returns true when this call
    /// performed the creation.
    pub fn container_resized(&mut self, size: ViewportSize) -> bool {
        match self.lifecycle {
            Lifecycle::Released => false,
            Lifecycle::Active => {
                if size.is_measurable() && size != self.viewport {
                    self.viewport = size;
                    self.surface.resize(size);
                }
                false
            }
            Lifecycle::AwaitingLayout => {
                if !size.is_measurable() {
                    debug!(width = size.width, height = size.height, "container not laid out yet");
                    return false;
                }
                if let Err(e) = self.surface.create(&self.options, size) {
                    warn!(error = %e, "map surface creation failed");
                    return false;
                }
                self.viewport = size;
                self.lifecycle = Lifecycle::Active;
                self.surface.set_view(self.view);
                if let Some(position) = self.marker.position {
                    self.render_marker(position);
                }
                true
            }
        }
    }

    /// Record `at` as the marker position, replacing any previous marker.
    /// Before the surface exists the position is kept and drawn on creation.
    pub fn place_marker(&mut self, at: Coordinate) {
        self.marker.position = Some(at);
        if self.lifecycle == Lifecycle::Active {
            self.render_marker(at);
        }
    }

    fn render_marker(&mut self, at: Coordinate) {
        if let Some(old) = self.marker.rendered.take() {
            self.surface.remove_marker(old);
        }
        self.marker.rendered = Some(self.surface.add_marker(at, &self.icon));
    }

    /// Re-center on `at`. `None` keeps the current zoom (a pan).
    pub fn center_on(&mut self, at: Coordinate, zoom: Option<u8>) {
        self.view.center = at;
        if let Some(z) = zoom {
            self.view.zoom = z.min(self.options.max_zoom);
        }
        if self.lifecycle == Lifecycle::Active {
            self.surface.set_view(self.view);
        }
    }

    /// Coordinate under a click, if the map is on screen.
    pub fn click_to_coordinate(&self, point: ScreenPoint) -> Option<Coordinate> {
        (self.lifecycle == Lifecycle::Active)
            .then(|| screen_to_coordinate(&self.view, self.viewport, point))
    }

    /// Tear down the surface. Further calls are ignored.
    pub fn release(&mut self) {
        if self.lifecycle == Lifecycle::Active {
            if let Some(id) = self.marker.rendered.take() {
                self.surface.remove_marker(id);
            }
            self.surface.destroy();
        }
        self.lifecycle = Lifecycle::Released;
        debug!("map released");
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    pub fn marker_position(&self) -> Option<Coordinate> {
        self.marker.position
    }

    pub fn view(&self) -> MapView {
        self.view
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::surface::HeadlessSurface;

    fn controller() -> MapController<HeadlessSurface> {
        MapController::new(HeadlessSurface::new(), MapOptions::default(), MarkerIcon::default())
    }

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn test_waits_for_measurable_size() {
        let mut map = controller();
        assert!(!map.container_resized(ViewportSize::new(0, 600)));
        assert_eq!(map.lifecycle(), Lifecycle::AwaitingLayout);
        assert!(map.container_resized(ViewportSize::new(800, 600)));
        assert!(map.is_active());
    }

    #[test]
    fn test_initializes_once() {
        let mut map = controller();
        map.container_resized(ViewportSize::new(800, 600));
        assert!(!map.container_resized(ViewportSize::new(800, 600)));
        assert!(!map.container_resized(ViewportSize::new(1024, 768)));
        assert_eq!(map.surface().creations(), 1);
        assert_eq!(map.surface().viewport(), ViewportSize::new(1024, 768));
    }

    #[test]
    fn test_many_placements_leave_one_marker() {
        let mut map = controller();
        map.container_resized(ViewportSize::new(800, 600));
        for i in 0..10 {
            map.place_marker(coord(f64::from(i), f64::from(i) * 2.0));
        }
        assert_eq!(map.surface().rendered_markers(), vec![coord(9.0, 18.0)]);
        assert_eq!(map.marker_position(), Some(coord(9.0, 18.0)));
    }

    #[test]
    fn test_pending_marker_rendered_on_creation() {
        let mut map = controller();
        map.place_marker(coord(1.0, 1.0));
        map.place_marker(coord(2.0, 2.0));
        assert!(map.surface().rendered_markers().is_empty());
        map.container_resized(ViewportSize::new(800, 600));
        assert_eq!(map.surface().rendered_markers(), vec![coord(2.0, 2.0)]);
    }

    #[test]
    fn test_marker_uses_configured_icon() {
        let icon = MarkerIcon { icon_url: "pin.svg".into(), ..MarkerIcon::default() };
        let mut map = MapController::new(HeadlessSurface::new(), MapOptions::default(), icon);
        map.container_resized(ViewportSize::new(100, 100));
        map.place_marker(coord(0.0, 0.0));
        assert_eq!(map.surface().marker_icons()[0].icon_url, "pin.svg");
    }

    #[test]
    fn test_center_on_clamps_zoom() {
        let mut map = controller();
        map.container_resized(ViewportSize::new(100, 100));
        map.center_on(coord(10.0, 10.0), Some(25));
        assert_eq!(map.view().zoom, 19);
        map.center_on(coord(11.0, 11.0), None);
        assert_eq!(map.surface().view().unwrap().center, coord(11.0, 11.0));
        assert_eq!(map.surface().view().unwrap().zoom, 19);
    }

    #[test]
    fn test_click_requires_active_map() {
        let mut map = controller();
        assert!(map.click_to_coordinate(ScreenPoint::new(1.0, 1.0)).is_none());
        map.container_resized(ViewportSize::new(200, 100));
        let c = map.click_to_coordinate(ScreenPoint::new(100.0, 50.0)).unwrap();
        assert!((c.lat() - 37.7749).abs() < 1e-9);
    }

    #[test]
    fn test_release_clears_surface_and_blocks_reinit() {
        let mut map = controller();
        map.container_resized(ViewportSize::new(800, 600));
        map.place_marker(coord(5.0, 5.0));
        map.release();
        assert!(!map.surface().is_active());
        assert!(map.surface().rendered_markers().is_empty());
        assert!(!map.container_resized(ViewportSize::new(800, 600)));
        assert_eq!(map.surface().creations(), 1);
    }
}
