//! Search input state and lookup sequencing.
//!
//! Every lookup gets a sequence number from one counter. A completion is
//! applied only if its number is still the pending one for its kind, so a
//! slow response to an old query can never overwrite newer results.

use tracing::debug;

use crate::location::{is_coordinates, Geocoder, LocationError, Suggestion};

pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    /// Background candidates while typing. Failures are silent.
    Suggest,
    /// Explicit submission, single best match.
    BestMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub seq: u64,
    pub kind: LookupKind,
    pub query: String,
    pub limit: usize,
}

impl LookupRequest {
    pub fn respond(&self, result: Result<Vec<Suggestion>, LocationError>) -> LookupResponse {
        LookupResponse {
            seq: self.seq,
            kind: self.kind,
            result,
        }
    }

    /// Perform the lookup synchronously.
    pub fn run(&self, geocoder: &dyn Geocoder) -> LookupResponse {
        self.respond(geocoder.search(&self.query, self.limit))
    }
}

#[derive(Debug, Clone)]
pub struct LookupResponse {
    pub seq: u64,
    pub kind: LookupKind,
    pub result: Result<Vec<Suggestion>, LocationError>,
}

#[derive(Debug, Clone)]
pub struct SearchState {
    input: String,
    suggestions: Vec<Suggestion>,
    visible: bool,
    limit: usize,
    next_seq: u64,
    pending_suggest: Option<u64>,
    pending_best_match: Option<u64>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new(DEFAULT_SUGGESTION_LIMIT)
    }
}

impl SearchState {
    pub fn new(limit: usize) -> Self {
        Self {
            input: String::new(),
            suggestions: Vec::new(),
            visible: false,
            limit: limit.max(1),
            next_seq: 0,
            pending_suggest: None,
            pending_best_match: None,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Store new input text. Returns a suggestion lookup when the trimmed
    /// text is a non-empty place query; otherwise the list is cleared.
    pub fn set_input(&mut self, text: &str) -> Option<LookupRequest> {
        self.input = text.to_string();
        let query = text.trim();
        if query.is_empty() || is_coordinates(query) {
            self.clear_suggestions();
            return None;
        }
        Some(self.issue(LookupKind::Suggest, query.to_string()))
    }

    /// Allocate a sequenced request and make it the pending one for its kind.
    pub fn issue(&mut self, kind: LookupKind, query: String) -> LookupRequest {
        self.next_seq += 1;
        let seq = self.next_seq;
        let limit = match kind {
            LookupKind::Suggest => {
                self.pending_suggest = Some(seq);
                self.limit
            }
            LookupKind::BestMatch => {
                self.pending_best_match = Some(seq);
                1
            }
        };
        LookupRequest { seq, kind, query, limit }
    }

    pub fn is_pending(&self, request: &LookupRequest) -> bool {
        self.pending(request.kind) == Some(request.seq)
    }

    fn pending(&self, kind: LookupKind) -> Option<u64> {
        match kind {
            LookupKind::Suggest => self.pending_suggest,
            LookupKind::BestMatch => self.pending_best_match,
        }
    }

    /// Claim a completion. Returns false for superseded or unknown responses.
    pub fn accept(&mut self, response: &LookupResponse) -> bool {
        if self.pending(response.kind) != Some(response.seq) {
            debug!(seq = response.seq, kind = ?response.kind, "discarding stale lookup response");
            return false;
        }
        match response.kind {
            LookupKind::Suggest => self.pending_suggest = None,
            LookupKind::BestMatch => self.pending_best_match = None,
        }
        true
    }

    pub fn show_suggestions(&mut self, mut suggestions: Vec<Suggestion>) {
        suggestions.truncate(self.limit);
        self.visible = !suggestions.is_empty();
        self.suggestions = suggestions;
    }

    /// Empty and hide the list, and forget any outstanding suggestion lookup.
    pub fn clear_suggestions(&mut self) {
        self.suggestions.clear();
        self.visible = false;
        self.pending_suggest = None;
    }

    /// Forget any outstanding best-match lookup.
    pub fn cancel_best_match(&mut self) {
        self.pending_best_match = None;
    }

    pub fn focus(&mut self) {
        self.visible = !self.suggestions.is_empty();
    }

    pub fn blur(&mut self) {
        self.visible = false;
    }

    /// Remove the chosen suggestion from play: the input takes its label and
    /// the list is cleared.
    pub fn take_suggestion(&mut self, index: usize) -> Option<Suggestion> {
        let chosen = self.suggestions.get(index)?.clone();
        self.input = chosen.label.clone();
        self.clear_suggestions();
        Some(chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Coordinate;

    fn suggestion(label: &str) -> Suggestion {
        Suggestion::new(label, Coordinate::new(1.0, 2.0).unwrap())
    }

    #[test]
    fn test_place_query_issues_suggest_request() {
        let mut s = SearchState::default();
        let req = s.set_input("  berlin ").unwrap();
        assert_eq!(req.kind, LookupKind::Suggest);
        assert_eq!(req.query, "berlin");
        assert_eq!(req.limit, 5);
        assert_eq!(s.input(), "  berlin ");
        assert!(s.is_pending(&req));
    }

    #[test]
    fn test_empty_input_clears_regardless_of_state() {
        let mut s = SearchState::default();
        let req = s.set_input("ber").unwrap();
        s.accept(&req.respond(Ok(vec![suggestion("Berlin")])));
        s.show_suggestions(vec![suggestion("Berlin")]);
        assert!(s.is_visible());

        assert!(s.set_input("   ").is_none());
        assert!(s.suggestions().is_empty());
        assert!(!s.is_visible());
    }

    #[test]
    fn test_coordinate_input_clears_and_skips_fetch() {
        let mut s = SearchState::default();
        s.show_suggestions(vec![suggestion("X")]);
        assert!(s.set_input("37.7749, -122.4194").is_none());
        assert!(s.suggestions().is_empty());
        assert!(!s.is_visible());
    }

    #[test]
    fn test_only_latest_suggest_accepted() {
        let mut s = SearchState::default();
        let old = s.set_input("ber").unwrap();
        let new = s.set_input("berl").unwrap();
        assert!(new.seq > old.seq);
        assert!(!s.accept(&old.respond(Ok(vec![]))));
        assert!(s.accept(&new.respond(Ok(vec![]))));
        // a second completion for the same request is not applied twice
        assert!(!s.accept(&new.respond(Ok(vec![]))));
    }

    #[test]
    fn test_clearing_invalidates_in_flight_suggest() {
        let mut s = SearchState::default();
        let req = s.set_input("ber").unwrap();
        s.set_input("");
        assert!(!s.accept(&req.respond(Ok(vec![suggestion("Berlin")]))));
    }

    #[test]
    fn test_kinds_are_sequenced_independently() {
        let mut s = SearchState::default();
        let suggest = s.set_input("ber").unwrap();
        let best = s.issue(LookupKind::BestMatch, "ber".into());
        assert_eq!(best.limit, 1);
        assert!(s.accept(&suggest.respond(Ok(vec![]))));
        assert!(s.accept(&best.respond(Ok(vec![]))));
    }

    #[test]
    fn test_show_truncates_and_sets_visibility() {
        let mut s = SearchState::new(2);
        s.show_suggestions(vec![suggestion("a"), suggestion("b"), suggestion("c")]);
        assert_eq!(s.suggestions().len(), 2);
        assert!(s.is_visible());
        s.show_suggestions(vec![]);
        assert!(!s.is_visible());
    }

    #[test]
    fn test_focus_and_blur() {
        let mut s = SearchState::default();
        s.focus();
        assert!(!s.is_visible());
        s.show_suggestions(vec![suggestion("a")]);
        s.blur();
        assert!(!s.is_visible());
        assert_eq!(s.suggestions().len(), 1);
        s.focus();
        assert!(s.is_visible());
    }

    #[test]
    fn test_take_suggestion() {
        let mut s = SearchState::default();
        s.set_input("par");
        s.show_suggestions(vec![suggestion("Paris, France"), suggestion("Paris, TX")]);
        let chosen = s.take_suggestion(1).unwrap();
        assert_eq!(chosen.label, "Paris, TX");
        assert_eq!(s.input(), "Paris, TX");
        assert!(s.suggestions().is_empty());
        assert!(!s.is_visible());
        assert!(s.take_suggestion(0).is_none());
    }
}
