//! Location providers: Nominatim geocoding and IP-based device geolocation.

use super::types::{Coordinate, GeolocationError, LocationError, Suggestion};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_GEOLOCATION_URL: &str = "https://ipapi.co/json/";
pub const DEFAULT_USER_AGENT: &str = "Solarpin/0.3 (location-picker)";

// ─── Traits ─────────────────────────────────────────────────────

/// Free-text place search.
///
/// Implementations return zero or more candidates ordered by relevance,
/// truncated to `limit`. An empty list means "no match", never an error.
pub trait Geocoder: Send + Sync + 'static {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<Suggestion>, LocationError>;
}

/// One-shot position fix for the current device.
pub trait Geolocator: Send + Sync + 'static {
    /// Capability check, consulted before `locate` is attempted.
    fn is_supported(&self) -> bool;

    fn locate(&self) -> Result<Coordinate, GeolocationError>;
}

// ─── Nominatim provider ─────────────────────────────────────────

/// Nominatim reports coordinates as strings; some mirrors send numbers.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
enum NumberField {
    Number(f64),
    Text(String),
}

impl NumberField {
    fn value(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
struct NominatimResult {
    display_name: String,
    lat: NumberField,
    lon: NumberField,
}

impl NominatimResult {
    fn into_suggestion(self) -> Option<Suggestion> {
        let coordinate = Coordinate::new(self.lat.value()?, self.lon.value()?)?;
        Some(Suggestion::new(self.display_name, coordinate))
    }
}

/// Geocoder backed by an OpenStreetMap Nominatim-compatible search endpoint.
pub struct NominatimGeocoder {
    agent: ureq::Agent,
    endpoint: String,
}

impl NominatimGeocoder {
    pub fn new(endpoint: impl Into<String>, user_agent: &str) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().user_agent(user_agent).build(),
            endpoint: endpoint.into(),
        }
    }

    fn search_url(&self, query: &str, limit: usize) -> String {
        format!(
            "{}?format=json&q={}&limit={}",
            self.endpoint,
            urlencod(query),
            limit,
        )
    }
}

impl Geocoder for NominatimGeocoder {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<Suggestion>, LocationError> {
        let url = self.search_url(query, limit);
        debug!(%url, "nominatim search");

        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| LocationError::Network(e.to_string()))?;

        let body: serde_json::Value = response
            .into_json()
            .map_err(|e| LocationError::InvalidResponse(e.to_string()))?;

        parse_search_response(body, limit)
    }
}

fn parse_search_response(
    body: serde_json::Value,
    limit: usize,
) -> Result<Vec<Suggestion>, LocationError> {
    let results: Vec<NominatimResult> = serde_json::from_value(body)
        .map_err(|e| LocationError::InvalidResponse(e.to_string()))?;

    Ok(results
        .into_iter()
        .filter_map(NominatimResult::into_suggestion)
        .take(limit)
        .collect())
}

// ─── IP-based geolocation ───────────────────────────────────────

#[derive(Deserialize)]
struct IpApiResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

/// Approximates the device position from its public IP address.
pub struct IpGeolocator {
    agent: ureq::Agent,
    endpoint: String,
    offline: bool,
}

impl IpGeolocator {
    pub fn new(endpoint: impl Into<String>, user_agent: &str) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().user_agent(user_agent).build(),
            endpoint: endpoint.into(),
            offline: false,
        }
    }

    /// Offline mode reports the capability as unavailable.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }
}

impl Geolocator for IpGeolocator {
    fn is_supported(&self) -> bool {
        !self.offline
    }

    fn locate(&self) -> Result<Coordinate, GeolocationError> {
        if self.offline {
            return Err(GeolocationError::Unsupported);
        }

        let response = self
            .agent
            .get(&self.endpoint)
            .call()
            .map_err(|e| GeolocationError::Failed(e.to_string()))?;

        let r: IpApiResult = response
            .into_json()
            .map_err(|e| GeolocationError::Failed(format!("invalid response: {}", e)))?;

        position_from_ipapi(r)
    }
}

fn position_from_ipapi(r: IpApiResult) -> Result<Coordinate, GeolocationError> {
    if r.error {
        let reason = r.reason.unwrap_or_else(|| "lookup refused".into());
        return Err(GeolocationError::Failed(reason));
    }
    let lat = r.latitude.ok_or_else(|| GeolocationError::Failed("no latitude".into()))?;
    let lng = r.longitude.ok_or_else(|| GeolocationError::Failed("no longitude".into()))?;
    Coordinate::new(lat, lng)
        .ok_or_else(|| GeolocationError::Failed(format!("position out of range: {}, {}", lat, lng)))
}

/// A geolocator with a preconfigured fix, or none at all.
#[derive(Debug, Clone, Default)]
pub struct FixedGeolocator {
    position: Option<Coordinate>,
}

impl FixedGeolocator {
    pub fn new(position: Option<Coordinate>) -> Self {
        Self { position }
    }
}

impl Geolocator for FixedGeolocator {
    fn is_supported(&self) -> bool {
        self.position.is_some()
    }

    fn locate(&self) -> Result<Coordinate, GeolocationError> {
        self.position.ok_or(GeolocationError::Unsupported)
    }
}

// ─── URL encoding (minimal, no extra dep) ───────────────────────

fn urlencod(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_urlencod() {
        assert_eq!(urlencod("New York"), "New%20York");
        assert_eq!(urlencod("a&b=c"), "a%26b%3Dc");
        assert_eq!(urlencod("Tromsø"), "Troms%C3%B8");
    }

    #[test]
    fn test_search_url() {
        let g = NominatimGeocoder::new("https://example.test/search", DEFAULT_USER_AGENT);
        assert_eq!(
            g.search_url("San Francisco", 5),
            "https://example.test/search?format=json&q=San%20Francisco&limit=5"
        );
    }

    #[test]
    fn test_parse_string_and_numeric_fields() {
        let body = json!([
            {"display_name": "Paris, France", "lat": "48.8566", "lon": "2.3522"},
            {"display_name": "Paris, TX, USA", "lat": 33.66, "lon": -95.55},
        ]);
        let out = parse_search_response(body, 5).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].label, "Paris, France");
        assert_eq!(out[0].coordinate.lat(), 48.8566);
        assert_eq!(out[1].coordinate.lng(), -95.55);
    }

    #[test]
    fn test_parse_skips_bad_candidates_and_truncates() {
        let body = json!([
            {"display_name": "Bad", "lat": "abc", "lon": "2.0"},
            {"display_name": "Out of range", "lat": "91.0", "lon": "2.0"},
            {"display_name": "A", "lat": "1.0", "lon": "1.0"},
            {"display_name": "B", "lat": "2.0", "lon": "2.0"},
        ]);
        let out = parse_search_response(body, 1).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].label, "A");
    }

    #[test]
    fn test_parse_empty_is_ok() {
        assert!(parse_search_response(json!([]), 5).unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed_is_invalid_response() {
        let err = parse_search_response(json!({"error": "bad"}), 5).unwrap_err();
        assert!(matches!(err, LocationError::InvalidResponse(_)));
    }

    #[test]
    fn test_ipapi_position() {
        let ok: IpApiResult =
            serde_json::from_value(json!({"latitude": 59.33, "longitude": 18.07})).unwrap();
        let c = position_from_ipapi(ok).unwrap();
        assert_eq!(c.lat(), 59.33);

        let refused: IpApiResult =
            serde_json::from_value(json!({"error": true, "reason": "RateLimited"})).unwrap();
        assert_eq!(
            position_from_ipapi(refused).unwrap_err(),
            GeolocationError::Failed("RateLimited".into())
        );

        let partial: IpApiResult = serde_json::from_value(json!({"latitude": 10.0})).unwrap();
        assert!(position_from_ipapi(partial).is_err());
    }

    #[test]
    fn test_offline_ip_geolocator_unsupported() {
        let mut g = IpGeolocator::new(DEFAULT_GEOLOCATION_URL, DEFAULT_USER_AGENT);
        g.set_offline(true);
        assert!(!g.is_supported());
        assert_eq!(g.locate().unwrap_err(), GeolocationError::Unsupported);
    }

    #[test]
    fn test_fixed_geolocator() {
        let none = FixedGeolocator::default();
        assert!(!none.is_supported());
        let here = Coordinate::new(21.4225, 39.8262).unwrap();
        let fixed = FixedGeolocator::new(Some(here));
        assert!(fixed.is_supported());
        assert_eq!(fixed.locate().unwrap(), here);
    }
}
