//! Location subsystem: literal coordinate parsing, place-name geocoding,
//! and device geolocation.
//!
//! Provides a Nominatim-backed geocoder, an offline built-in gazetteer,
//! and IP-based or fixed position providers.

pub mod builtin;
pub mod coords;
pub mod providers;
pub mod types;

pub use builtin::BuiltinGeocoder;
pub use coords::{format_coords, is_coordinates, parse_coordinates};
pub use providers::{FixedGeolocator, Geocoder, Geolocator, IpGeolocator, NominatimGeocoder};
pub use types::{Coordinate, GeolocationError, LocationError, Suggestion};
