//! Built-in offline gazetteer with fuzzy matching.
//!
//! Used in offline mode in place of a network geocoder. Ranking is
//! exact name/alias, then substring, then edit distance ≤ 2.

use super::providers::Geocoder;
use super::types::{Coordinate, LocationError, Suggestion};

struct BuiltinPlace {
    names: &'static [&'static str], // canonical + aliases
    label: &'static str,
    lat: f64,
    lng: f64,
}

const BUILTIN_PLACES: &[BuiltinPlace] = &[
    BuiltinPlace {
        names: &["san francisco", "sf"],
        label: "San Francisco, California, United States",
        lat: 37.7749, lng: -122.4194,
    },
    BuiltinPlace {
        names: &["los angeles", "la"],
        label: "Los Angeles, California, United States",
        lat: 34.0522, lng: -118.2437,
    },
    BuiltinPlace {
        names: &["phoenix"],
        label: "Phoenix, Arizona, United States",
        lat: 33.4484, lng: -112.0740,
    },
    BuiltinPlace {
        names: &["new york", "newyork", "nyc"],
        label: "New York, United States",
        lat: 40.7128, lng: -74.0060,
    },
    BuiltinPlace {
        names: &["austin"],
        label: "Austin, Texas, United States",
        lat: 30.2672, lng: -97.7431,
    },
    BuiltinPlace {
        names: &["denver"],
        label: "Denver, Colorado, United States",
        lat: 39.7392, lng: -104.9903,
    },
    BuiltinPlace {
        names: &["stockholm", "stokholm"],
        label: "Stockholm, Sweden",
        lat: 59.3293, lng: 18.0686,
    },
    BuiltinPlace {
        names: &["tromso", "tromsø", "tromsoe"],
        label: "Tromsø, Norway",
        lat: 69.6492, lng: 18.9553,
    },
    BuiltinPlace {
        names: &["london"],
        label: "London, United Kingdom",
        lat: 51.5074, lng: -0.1278,
    },
    BuiltinPlace {
        names: &["paris"],
        label: "Paris, France",
        lat: 48.8566, lng: 2.3522,
    },
    BuiltinPlace {
        names: &["berlin"],
        label: "Berlin, Germany",
        lat: 52.5200, lng: 13.4050,
    },
    BuiltinPlace {
        names: &["madrid"],
        label: "Madrid, Spain",
        lat: 40.4168, lng: -3.7038,
    },
    BuiltinPlace {
        names: &["cairo", "al-qahirah"],
        label: "Cairo, Egypt",
        lat: 30.0444, lng: 31.2357,
    },
    BuiltinPlace {
        names: &["riyadh"],
        label: "Riyadh, Saudi Arabia",
        lat: 24.7136, lng: 46.6753,
    },
    BuiltinPlace {
        names: &["dubai"],
        label: "Dubai, United Arab Emirates",
        lat: 25.2048, lng: 55.2708,
    },
    BuiltinPlace {
        names: &["mumbai", "bombay"],
        label: "Mumbai, Maharashtra, India",
        lat: 19.0760, lng: 72.8777,
    },
    BuiltinPlace {
        names: &["tokyo"],
        label: "Tokyo, Japan",
        lat: 35.6762, lng: 139.6503,
    },
    BuiltinPlace {
        names: &["sydney"],
        label: "Sydney, New South Wales, Australia",
        lat: -33.8688, lng: 151.2093,
    },
    BuiltinPlace {
        names: &["nairobi"],
        label: "Nairobi, Kenya",
        lat: -1.2921, lng: 36.8219,
    },
    BuiltinPlace {
        names: &["sao paulo", "são paulo"],
        label: "São Paulo, Brazil",
        lat: -23.5505, lng: -46.6333,
    },
];

/// Compute edit distance between two strings (Levenshtein).
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let n = b.len();

    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[n]
}

/// Shortest query that may match as a fragment of a longer name.
const MIN_FRAGMENT_LEN: usize = 2;
/// Shortest name that may match as a fragment of a longer query.
const MIN_EMBEDDED_NAME_LEN: usize = 3;
/// Both sides must be at least this long for typo tolerance.
const MIN_FUZZY_LEN: usize = 4;

/// Match quality; lower is better.
fn match_rank(query: &str, name: &str) -> Option<usize> {
    let query_len = query.chars().count();
    let name_len = name.chars().count();

    if name == query {
        Some(0)
    } else if (query_len >= MIN_FRAGMENT_LEN && name.contains(query))
        || (name_len >= MIN_EMBEDDED_NAME_LEN && query.contains(name))
    {
        Some(1)
    } else if query_len >= MIN_FUZZY_LEN && name_len >= MIN_FUZZY_LEN {
        let dist = edit_distance(query, name);
        (dist <= 2).then_some(1 + dist)
    } else {
        None
    }
}

/// Offline geocoder over the built-in place list.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinGeocoder;

impl BuiltinGeocoder {
    fn ranked(query: &str) -> Vec<&'static BuiltinPlace> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<(usize, usize, &BuiltinPlace)> = BUILTIN_PLACES
            .iter()
            .enumerate()
            .filter_map(|(index, place)| {
                place
                    .names
                    .iter()
                    .filter_map(|name| match_rank(&q, name))
                    .min()
                    .map(|rank| (rank, index, place))
            })
            .collect();

        hits.sort_by_key(|&(rank, index, _)| (rank, index));
        hits.into_iter().map(|(_, _, place)| place).collect()
    }
}

impl Geocoder for BuiltinGeocoder {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<Suggestion>, LocationError> {
        Ok(Self::ranked(query)
            .into_iter()
            .filter_map(|p| Coordinate::new(p.lat, p.lng).map(|c| Suggestion::new(p.label, c)))
            .take(limit)
            .collect())
    }
}
