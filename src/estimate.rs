//! Mock rooftop solar estimate for a selected coordinate.
//!
//! Stands in for a real building-insights source. Sunshine hours follow
//! latitude; array geometry gets a jitter derived from the coordinate so the
//! same point always yields the same estimate.

use serde::Serialize;

use crate::location::Coordinate;

const PANEL_AREA_M2: f64 = 1.7;
const PANEL_CAPACITY_WATTS: f64 = 350.0;
const SUNSHINE_QUANTILES: [f64; 5] = [800.0, 1000.0, 1200.0, 1400.0, 1600.0];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolarEstimate {
    pub max_sunshine_hours_per_year: f64,
    pub max_array_panels_count: u32,
    pub max_array_area_meters2: f64,
    pub yearly_energy_dc_kwh: f64,
    pub panel_capacity_watts: f64,
    pub roof_segment_stats: Vec<RoofSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoofSegment {
    pub pitch_degrees: f64,
    pub azimuth_degrees: f64,
    pub stats: RoofSegmentStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoofSegmentStats {
    pub area_meters2: f64,
    pub sunshine_quantiles: Vec<f64>,
    pub ground_area_meters2: f64,
}

/// Stable pseudo-random fraction in [0, 1) for a coordinate and salt.
fn jitter(at: Coordinate, salt: f64) -> f64 {
    let seed = at.lat() * 12.9898 + at.lng() * 78.233 + salt * 37.719;
    let x = seed.sin() * 43_758.545_3;
    x - x.floor()
}

pub fn mock_estimate(at: Coordinate) -> SolarEstimate {
    let max_sunshine_hours_per_year = (1200.0 + at.lat() * 10.0).clamp(800.0, 2500.0);
    let max_array_area_meters2 = 50.0 + jitter(at, 1.0) * 100.0;
    let max_array_panels_count = (max_array_area_meters2 / PANEL_AREA_M2).floor() as u32;
    let yearly_energy_dc_kwh =
        f64::from(max_array_panels_count) * PANEL_CAPACITY_WATTS * (max_sunshine_hours_per_year / 1000.0);

    SolarEstimate {
        max_sunshine_hours_per_year,
        max_array_panels_count,
        max_array_area_meters2,
        yearly_energy_dc_kwh,
        panel_capacity_watts: PANEL_CAPACITY_WATTS,
        roof_segment_stats: vec![RoofSegment {
            pitch_degrees: 15.0 + jitter(at, 2.0) * 20.0,
            azimuth_degrees: 180.0 + jitter(at, 3.0) * 40.0 - 20.0,
            stats: RoofSegmentStats {
                area_meters2: max_array_area_meters2 * 0.6,
                sunshine_quantiles: SUNSHINE_QUANTILES.to_vec(),
                ground_area_meters2: max_array_area_meters2 * 0.55,
            },
        }],
    }
}
