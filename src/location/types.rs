//! Core types for the location subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated latitude/longitude pair.
///
/// Latitude is always within [-90, 90] and longitude within [-180, 180];
/// the only ways to build one (`new`, deserialization) enforce that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    lat: f64,
    lng: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = String;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.lat, raw.lng).ok_or_else(|| {
            format!(
                "coordinate out of range: lat {} (-90..90), lng {} (-180..180)",
                raw.lat, raw.lng
            )
        })
    }
}

impl Coordinate {
    /// Returns `None` when either component is out of range or not finite.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) {
            Some(Self { lat, lng })
        } else {
            None
        }
    }

    /// Clamp arbitrary values into range; non-finite components become 0.
    pub fn clamped(lat: f64, lng: f64) -> Self {
        let finite_or_zero = |v: f64| if v.is_finite() { v } else { 0.0 };
        Self {
            lat: finite_or_zero(lat).clamp(-90.0, 90.0),
            lng: finite_or_zero(lng).clamp(-180.0, 180.0),
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lat, self.lng)
    }
}

/// A ranked place candidate returned by a geocoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub label: String,
    #[serde(flatten)]
    pub coordinate: Coordinate,
}

impl Suggestion {
    pub fn new(label: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            label: label.into(),
            coordinate,
        }
    }
}

/// Geocoding failures. Zero results are not an error: lookups return an
/// empty list instead.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LocationError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

/// Device geolocation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("Geolocation is not supported on this device")]
    Unsupported,
    #[error("{0}")]
    Failed(String),
}
