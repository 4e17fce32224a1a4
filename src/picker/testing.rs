//! Test doubles shared by the picker and session tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::host::{Notice, PickerHost, Selection};
use crate::location::{Coordinate, GeolocationError, Geocoder, Geolocator, LocationError, Suggestion};

#[derive(Debug, Default)]
pub struct HostLog {
    pub selections: Vec<Selection>,
    pub notices: Vec<Notice>,
    pub suggestion_updates: Vec<(Vec<Suggestion>, bool)>,
}

/// A host whose log stays readable after the host is moved into a picker.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    log: Arc<Mutex<HostLog>>,
}

impl RecordingHost {
    pub fn selections(&self) -> Vec<Selection> {
        self.log.lock().unwrap().selections.clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.log.lock().unwrap().notices.clone()
    }

    pub fn last_suggestions(&self) -> Option<(Vec<Suggestion>, bool)> {
        self.log.lock().unwrap().suggestion_updates.last().cloned()
    }
}

impl PickerHost for RecordingHost {
    fn on_location_select(&mut self, selection: &Selection) {
        self.log.lock().unwrap().selections.push(selection.clone());
    }

    fn show_notice(&mut self, notice: &Notice) {
        self.log.lock().unwrap().notices.push(notice.clone());
    }

    fn suggestions_changed(&mut self, suggestions: &[Suggestion], visible: bool) {
        self.log
            .lock()
            .unwrap()
            .suggestion_updates
            .push((suggestions.to_vec(), visible));
    }
}

/// Canned answers per query, with an optional delay to force reordering.
#[derive(Default)]
pub struct ScriptedGeocoder {
    answers: HashMap<String, (Duration, Result<Vec<Suggestion>, LocationError>)>,
}

impl ScriptedGeocoder {
    pub fn answer(mut self, query: &str, labels: &[(&str, f64, f64)]) -> Self {
        self.answers.insert(query.into(), (Duration::ZERO, Ok(suggestions(labels))));
        self
    }

    pub fn slow_answer(mut self, query: &str, delay: Duration, labels: &[(&str, f64, f64)]) -> Self {
        self.answers.insert(query.into(), (delay, Ok(suggestions(labels))));
        self
    }

    pub fn fail(mut self, query: &str) -> Self {
        self.answers.insert(
            query.into(),
            (Duration::ZERO, Err(LocationError::Network("connection refused".into()))),
        );
        self
    }
}

impl Geocoder for ScriptedGeocoder {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<Suggestion>, LocationError> {
        match self.answers.get(query) {
            Some((delay, result)) => {
                if !delay.is_zero() {
                    std::thread::sleep(*delay);
                }
                result.clone().map(|mut v| {
                    v.truncate(limit);
                    v
                })
            }
            None => Ok(Vec::new()),
        }
    }
}

/// Answers with a fixed position after a delay.
pub struct SlowGeolocator {
    position: Coordinate,
    delay: Duration,
}

impl SlowGeolocator {
    pub fn new(position: Coordinate, delay: Duration) -> Self {
        Self { position, delay }
    }
}

impl Geolocator for SlowGeolocator {
    fn is_supported(&self) -> bool {
        true
    }

    fn locate(&self) -> Result<Coordinate, GeolocationError> {
        std::thread::sleep(self.delay);
        Ok(self.position)
    }
}

pub fn suggestions(labels: &[(&str, f64, f64)]) -> Vec<Suggestion> {
    labels
        .iter()
        .map(|(label, lat, lng)| Suggestion::new(*label, Coordinate::new(*lat, *lng).unwrap()))
        .collect()
}

pub fn coord(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).unwrap()
}
