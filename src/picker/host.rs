//! The outward seam of the picker: selections, notices, suggestion updates.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::location::{Coordinate, GeolocationError, Suggestion};

/// A resolved location, as handed to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    #[serde(flatten)]
    pub coordinate: Coordinate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub selected_at: DateTime<Utc>,
}

impl Selection {
    pub fn new(coordinate: Coordinate, label: Option<String>) -> Self {
        Self {
            coordinate,
            label,
            selected_at: Utc::now(),
        }
    }

    pub fn lat(&self) -> f64 {
        self.coordinate.lat()
    }

    pub fn lng(&self) -> f64 {
        self.coordinate.lng()
    }
}

/// A user-visible advisory. None of these are fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    LocationNotFound,
    SearchFailed,
    GeolocationUnsupported,
    GeolocationFailed(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocationNotFound => write!(
                f,
                "Location not found. Please try coordinates (e.g., 37.7749, -122.4194) or a different address."
            ),
            Self::SearchFailed => write!(f, "Error searching for location. Please try again."),
            Self::GeolocationUnsupported => write!(f, "Geolocation is not supported on this device"),
            Self::GeolocationFailed(reason) => write!(f, "Unable to retrieve your location: {}", reason),
        }
    }
}

impl From<GeolocationError> for Notice {
    fn from(e: GeolocationError) -> Self {
        match e {
            GeolocationError::Unsupported => Self::GeolocationUnsupported,
            GeolocationError::Failed(reason) => Self::GeolocationFailed(reason),
        }
    }
}

/// Receives everything the picker reports outward.
pub trait PickerHost: Send + 'static {
    /// Called exactly once per successful resolution, after the marker moved.
    fn on_location_select(&mut self, selection: &Selection);

    fn show_notice(&mut self, notice: &Notice);

    fn suggestions_changed(&mut self, _suggestions: &[Suggestion], _visible: bool) {}
}
