//! The location picker: turns clicks, typed text, suggestion picks and
//! current-location fixes into a single selected coordinate.
//!
//! Every resolution goes through `select_location`, which moves the one
//! marker, re-centers the map and notifies the host, in that order. The
//! picker itself performs no I/O: lookups are handed out as
//! `LookupRequest`s and fed back through `lookup_completed`. See
//! `session` for the async driver.

pub mod host;
pub mod search;
pub mod session;

#[cfg(test)]
mod testing;

use tracing::{debug, info, warn};

use crate::config::PickerConfig;
use crate::location::{parse_coordinates, Coordinate, GeolocationError};
use crate::map::{MapController, MapSurface, ScreenPoint, ViewportSize};

pub use host::{Notice, PickerHost, Selection};
pub use search::{LookupKind, LookupRequest, LookupResponse, SearchState};
pub use session::{PickerEvent, PickerHandle, PickerSnapshot};

pub struct LocationPicker<S: MapSurface, H: PickerHost> {
    search: SearchState,
    map: MapController<S>,
    host: H,
    selection_zoom: u8,
    last_selection: Option<Selection>,
    selection_epoch: u64,
}

impl<S: MapSurface, H: PickerHost> LocationPicker<S, H> {
    pub fn new(surface: S, host: H, config: &PickerConfig) -> Self {
        Self {
            search: SearchState::new(config.suggestion_limit),
            map: MapController::new(surface, config.map.clone(), config.marker_icon.clone()),
            host,
            selection_zoom: config.selection_zoom,
            last_selection: None,
            selection_epoch: 0,
        }
    }

    // ─── Map lifecycle ──────────────────────────────────────────

    pub fn container_resized(&mut self, size: ViewportSize) {
        if self.map.container_resized(size) {
            info!(width = size.width, height = size.height, "map initialized");
        }
    }

    /// Release the map and ignore any lookups still in flight.
    pub fn unmount(&mut self) {
        self.search.clear_suggestions();
        self.search.cancel_best_match();
        self.map.release();
    }

    fn is_unmounted(&self) -> bool {
        self.map.lifecycle() == crate::map::Lifecycle::Released
    }

    // ─── Text input ─────────────────────────────────────────────

    /// Returns the suggestion lookup to run, if the text is a place query.
    pub fn input_changed(&mut self, text: &str) -> Option<LookupRequest> {
        if self.is_unmounted() {
            return None;
        }
        let had_list = !self.search.suggestions().is_empty() || self.search.is_visible();
        let request = self.search.set_input(text);
        if request.is_none() && had_list {
            self.publish_suggestions();
        }
        request
    }

    pub fn focus(&mut self) {
        if self.is_unmounted() {
            return;
        }
        let was_visible = self.search.is_visible();
        self.search.focus();
        if self.search.is_visible() != was_visible {
            self.publish_suggestions();
        }
    }

    pub fn blur(&mut self) {
        if self.is_unmounted() {
            return;
        }
        if self.search.is_visible() {
            self.search.blur();
            self.publish_suggestions();
        }
    }

    /// Explicit submission (Enter or the search button). Literal coordinates
    /// resolve immediately; anything else becomes a best-match lookup.
    pub fn submit(&mut self) -> Option<LookupRequest> {
        if self.is_unmounted() {
            return None;
        }
        let query = self.search.input().trim().to_string();
        if query.is_empty() {
            return None;
        }

        if let Some(coordinate) = parse_coordinates(&query) {
            self.search.clear_suggestions();
            self.publish_suggestions();
            self.select_location(coordinate, Some(query), Recenter::Zoom);
            return None;
        }

        Some(self.search.issue(LookupKind::BestMatch, query))
    }

    pub fn lookup_completed(&mut self, response: LookupResponse) {
        if self.is_unmounted() || !self.search.accept(&response) {
            return;
        }

        match (response.kind, response.result) {
            (LookupKind::Suggest, Ok(found)) => {
                debug!(seq = response.seq, count = found.len(), "suggestions received");
                self.search.show_suggestions(found);
                self.publish_suggestions();
            }
            (LookupKind::Suggest, Err(e)) => {
                debug!(seq = response.seq, error = %e, "suggestion lookup failed");
                self.search.clear_suggestions();
                self.publish_suggestions();
            }
            (LookupKind::BestMatch, Ok(found)) => match found.into_iter().next() {
                Some(best) => {
                    self.search.clear_suggestions();
                    self.publish_suggestions();
                    self.select_location(best.coordinate, Some(best.label), Recenter::Zoom);
                }
                None => self.host.show_notice(&Notice::LocationNotFound),
            },
            (LookupKind::BestMatch, Err(e)) => {
                warn!(seq = response.seq, error = %e, "location search failed");
                self.host.show_notice(&Notice::SearchFailed);
            }
        }
    }

    /// Select the suggestion at `index` of the current list.
    pub fn pick_suggestion(&mut self, index: usize) -> bool {
        if self.is_unmounted() {
            return false;
        }
        let Some(chosen) = self.search.take_suggestion(index) else {
            return false;
        };
        self.publish_suggestions();
        self.select_location(chosen.coordinate, Some(chosen.label), Recenter::Zoom);
        true
    }

    // ─── Other inputs ───────────────────────────────────────────

    pub fn map_clicked(&mut self, point: ScreenPoint) -> bool {
        if self.is_unmounted() {
            return false;
        }
        match self.map.click_to_coordinate(point) {
            Some(coordinate) => {
                self.select_location(coordinate, None, Recenter::Pan);
                true
            }
            None => false,
        }
    }

    pub fn geolocation_completed(&mut self, result: Result<Coordinate, GeolocationError>) {
        if self.is_unmounted() {
            return;
        }
        match result {
            Ok(coordinate) => self.select_location(coordinate, None, Recenter::Zoom),
            Err(e) => {
                if let GeolocationError::Failed(reason) = &e {
                    warn!(%reason, "geolocation failed");
                }
                self.host.show_notice(&Notice::from(e));
            }
        }
    }

    // ─── Selection ──────────────────────────────────────────────

    /// Any resolution supersedes an Enter lookup still in flight.
    fn select_location(&mut self, coordinate: Coordinate, label: Option<String>, recenter: Recenter) {
        self.search.cancel_best_match();
        self.selection_epoch += 1;
        self.map.place_marker(coordinate);
        let zoom = match recenter {
            Recenter::Zoom => Some(self.selection_zoom),
            Recenter::Pan => None,
        };
        self.map.center_on(coordinate, zoom);

        let selection = Selection::new(coordinate, label);
        info!(
            lat = selection.lat(),
            lng = selection.lng(),
            label = selection.label.as_deref().unwrap_or(""),
            "location selected"
        );
        self.host.on_location_select(&selection);
        self.last_selection = Some(selection);
    }

    fn publish_suggestions(&mut self) {
        self.host
            .suggestions_changed(self.search.suggestions(), self.search.is_visible());
    }

    // ─── Accessors ──────────────────────────────────────────────

    /// True while `request` is the one whose response would be applied.
    pub fn is_pending(&self, request: &LookupRequest) -> bool {
        !self.is_unmounted() && self.search.is_pending(request)
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn map(&self) -> &MapController<S> {
        &self.map
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn last_selection(&self) -> Option<&Selection> {
        self.last_selection.as_ref()
    }

    /// Advances on every selection. A position fix requested at an older
    /// epoch has been overtaken and should be dropped.
    pub fn selection_epoch(&self) -> u64 {
        self.selection_epoch
    }
}

#[derive(Debug, Clone, Copy)]
enum Recenter {
    /// Move to the selection zoom.
    Zoom,
    /// Keep the current zoom.
    Pan,
}
