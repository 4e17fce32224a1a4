//! Map surface: projection, the rendering seam, and the marker controller.

pub mod controller;
pub mod projection;
pub mod surface;

pub use controller::{Lifecycle, MapController, MarkerState};
pub use projection::{MapView, ScreenPoint, ViewportSize};
pub use surface::{HeadlessSurface, MapError, MapOptions, MapSurface, MarkerIcon, MarkerId, MAX_SUPPORTED_ZOOM};
