//! Map rendering seam: the `MapSurface` trait, its configuration values,
//! and an in-memory surface for headless use.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::projection::{tile_index, MapView, ViewportSize};
use crate::location::Coordinate;

pub const DEFAULT_TILE_URL: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}";
pub const DEFAULT_ATTRIBUTION: &str = "Tiles © Esri";

/// Deepest zoom any tile source is expected to serve.
pub const MAX_SUPPORTED_ZOOM: u8 = 24;

/// Marker appearance, passed explicitly with every placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerIcon {
    pub icon_url: String,
    pub icon_retina_url: String,
    pub shadow_url: String,
    pub icon_size: [u32; 2],
    pub icon_anchor: [i32; 2],
    pub popup_anchor: [i32; 2],
    pub shadow_size: [u32; 2],
}

impl Default for MarkerIcon {
    fn default() -> Self {
        Self {
            icon_url: "images/marker-icon.png".into(),
            icon_retina_url: "images/marker-icon-2x.png".into(),
            shadow_url: "images/marker-shadow.png".into(),
            icon_size: [25, 41],
            icon_anchor: [12, 41],
            popup_anchor: [1, -34],
            shadow_size: [41, 41],
        }
    }
}

/// Basemap configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    pub center: Coordinate,
    pub zoom: u8,
    pub max_zoom: u8,
    /// Tile URL template with `{z}`, `{x}`, `{y}` placeholders.
    pub tile_url: String,
    pub attribution: String,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center: Coordinate::clamped(37.7749, -122.4194),
            zoom: 18,
            max_zoom: 19,
            tile_url: DEFAULT_TILE_URL.into(),
            attribution: DEFAULT_ATTRIBUTION.into(),
        }
    }
}

impl MapOptions {
    pub fn tile_url_for(&self, z: u8, x: u32, y: u32) -> String {
        self.tile_url
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(pub u64);

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("map surface unavailable: {0}")]
    Surface(String),
}

/// The rendering primitive a `MapController` drives.
///
/// Implementations only draw; lifecycle rules (create once, one marker)
/// are enforced by the controller.
pub trait MapSurface: Send + 'static {
    fn create(&mut self, options: &MapOptions, viewport: ViewportSize) -> Result<(), MapError>;

    fn resize(&mut self, viewport: ViewportSize);

    fn add_marker(&mut self, at: Coordinate, icon: &MarkerIcon) -> MarkerId;

    fn remove_marker(&mut self, id: MarkerId);

    fn set_view(&mut self, view: MapView);

    fn destroy(&mut self);
}

// ─── Headless surface ───────────────────────────────────────────

/// In-memory surface that records what a real renderer would show.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    options: Option<MapOptions>,
    viewport: ViewportSize,
    view: Option<MapView>,
    markers: BTreeMap<MarkerId, (Coordinate, MarkerIcon)>,
    next_id: u64,
    creations: usize,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.options.is_some()
    }

    /// How many times `create` has been called over the surface's life.
    pub fn creations(&self) -> usize {
        self.creations
    }

    pub fn rendered_markers(&self) -> Vec<Coordinate> {
        self.markers.values().map(|(c, _)| *c).collect()
    }

    pub fn marker_icons(&self) -> Vec<&MarkerIcon> {
        self.markers.values().map(|(_, icon)| icon).collect()
    }

    pub fn view(&self) -> Option<MapView> {
        self.view
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    /// URL of the tile under the view center.
    pub fn center_tile_url(&self) -> Option<String> {
        let options = self.options.as_ref()?;
        let view = self.view?;
        let (x, y) = tile_index(view.center, view.zoom);
        Some(options.tile_url_for(view.zoom, x, y))
    }
}

impl MapSurface for HeadlessSurface {
    fn create(&mut self, options: &MapOptions, viewport: ViewportSize) -> Result<(), MapError> {
        self.options = Some(options.clone());
        self.viewport = viewport;
        self.creations += 1;
        debug!(width = viewport.width, height = viewport.height, "headless map created");
        Ok(())
    }

    fn resize(&mut self, viewport: ViewportSize) {
        self.viewport = viewport;
    }

    fn add_marker(&mut self, at: Coordinate, icon: &MarkerIcon) -> MarkerId {
        self.next_id += 1;
        let id = MarkerId(self.next_id);
        self.markers.insert(id, (at, icon.clone()));
        debug!(marker = id.0, lat = at.lat(), lng = at.lng(), "marker added");
        id
    }

    fn remove_marker(&mut self, id: MarkerId) {
        self.markers.remove(&id);
    }

    fn set_view(&mut self, view: MapView) {
        self.view = Some(view);
        if let Some(url) = self.center_tile_url() {
            debug!(zoom = view.zoom, tile = %url, "view moved");
        }
    }

    fn destroy(&mut self) {
        self.markers.clear();
        self.options = None;
        self.view = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_icon_dimensions() {
        let icon = MarkerIcon::default();
        assert_eq!(icon.icon_size, [25, 41]);
        assert_eq!(icon.icon_anchor, [12, 41]);
        assert_eq!(icon.popup_anchor, [1, -34]);
        assert_eq!(icon.shadow_size, [41, 41]);
    }

    #[test]
    fn test_tile_url_template() {
        let opts = MapOptions::default();
        assert_eq!(
            opts.tile_url_for(3, 1, 2),
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/3/2/1"
        );
    }

    #[test]
    fn test_headless_center_tile() {
        let mut s = HeadlessSurface::new();
        assert!(s.center_tile_url().is_none());
        s.create(&MapOptions::default(), ViewportSize::new(10, 10)).unwrap();
        s.set_view(MapView { center: Coordinate::new(0.0, 0.0).unwrap(), zoom: 1 });
        assert!(s.center_tile_url().unwrap().ends_with("/tile/1/1/1"));
    }

    #[test]
    fn test_map_options_partial_json() {
        let opts: MapOptions = serde_json::from_str(r#"{"zoom": 12}"#).unwrap();
        assert_eq!(opts.zoom, 12);
        assert_eq!(opts.max_zoom, 19);
        assert_eq!(opts.center.lat(), 37.7749);
    }
}
