//! Literal coordinate detection for free-text input.
//!
//! Accepted forms (after trimming):
//!   `37.7749, -122.4194`   decimal pair, separated by commas and/or whitespace
//!   `37.7749 -122.4194`    decimal pair, whitespace only
//!   `37 -122` / `37,-122`  integer pair
//!
//! A decimal paired with an integer is not a coordinate. Anything that does
//! not match, or matches but falls outside lat -90..90 / lng -180..180, is
//! treated as a place-name query by the caller.

use super::types::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberShape {
    Integer,
    Decimal,
}

/// Classify `input` as a literal coordinate pair.
pub fn parse_coordinates(input: &str) -> Option<Coordinate> {
    let text = input.trim();
    let split = text.find(is_separator)?;
    let (first, rest) = text.split_at(split);
    let second = rest.trim_start_matches(is_separator);

    let first_shape = number_shape(first)?;
    let second_shape = number_shape(second)?;
    if first_shape != second_shape {
        return None;
    }

    let lat: f64 = first.parse().ok()?;
    let lng: f64 = second.parse().ok()?;
    Coordinate::new(lat, lng)
}

/// True when `input` would be resolved directly, without a lookup.
pub fn is_coordinates(input: &str) -> bool {
    parse_coordinates(input).is_some()
}

fn is_separator(c: char) -> bool {
    c == ',' || c.is_whitespace()
}

/// `-?\d+` or `-?\d+\.\d+`, ASCII digits only.
fn number_shape(token: &str) -> Option<NumberShape> {
    let unsigned = token.strip_prefix('-').unwrap_or(token);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (unsigned, None),
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) {
        return None;
    }
    match fraction {
        None => Some(NumberShape::Integer),
        Some(f) if all_digits(f) => Some(NumberShape::Decimal),
        Some(_) => None,
    }
}

/// Format coordinates with hemisphere letters, e.g. `59.3293°N, 18.0686°E`.
pub fn format_coords(lat: f64, lng: f64) -> String {
    let lat_dir = if lat >= 0.0 { 'N' } else { 'S' };
    let lng_dir = if lng >= 0.0 { 'E' } else { 'W' };
    format!("{:.4}°{}, {:.4}°{}", lat.abs(), lat_dir, lng.abs(), lng_dir)
}
