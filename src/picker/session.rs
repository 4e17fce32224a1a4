//! Async driver for a `LocationPicker`.
//!
//! One task owns the picker. UI events arrive over a channel; lookups and
//! position fixes run on the blocking pool and come back as completions on
//! the same loop, so the picker never has more than one writer and keeps
//! accepting input while requests are outstanding. Suggestion lookups are
//! debounced: a request is only sent if it is still the latest once the
//! delay has elapsed. Dropping or unmounting the handle aborts every timer
//! and pending completion and releases the map.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

use super::host::{PickerHost, Selection};
use super::search::{LookupKind, LookupRequest, LookupResponse};
use super::LocationPicker;
use crate::location::{Coordinate, GeolocationError, Geocoder, Geolocator, LocationError, Suggestion};
use crate::map::{MapSurface, ScreenPoint, ViewportSize};

#[derive(Debug, Clone, PartialEq)]
pub enum PickerEvent {
    Resized(ViewportSize),
    Input(String),
    Focus,
    Blur,
    Submit,
    PickSuggestion(usize),
    Click(ScreenPoint),
    UseCurrentLocation,
}

/// Point-in-time view of a running picker.
#[derive(Debug, Clone, Serialize)]
pub struct PickerSnapshot {
    pub input: String,
    pub suggestions: Vec<Suggestion>,
    pub suggestions_visible: bool,
    pub marker: Option<Coordinate>,
    pub map_active: bool,
    pub last_selection: Option<Selection>,
}

#[derive(Debug, thiserror::Error)]
#[error("picker session has shut down")]
pub struct SessionClosed;

enum Command {
    Event(PickerEvent),
    Snapshot(oneshot::Sender<PickerSnapshot>),
    Unmount,
}

enum Completion {
    Debounced(LookupRequest),
    Lookup(LookupResponse),
    Position {
        epoch: u64,
        result: Result<Coordinate, GeolocationError>,
    },
}

struct PickerSession<S: MapSurface, H: PickerHost> {
    picker: LocationPicker<S, H>,
    geocoder: Arc<dyn Geocoder>,
    geolocator: Arc<dyn Geolocator>,
    debounce: Duration,
    commands: mpsc::UnboundedReceiver<Command>,
    tasks: JoinSet<Completion>,
}

/// Handle to a spawned picker session.
pub struct PickerHandle {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl PickerHandle {
    /// Spawn a session on the current tokio runtime.
    pub fn spawn<S: MapSurface, H: PickerHost>(
        picker: LocationPicker<S, H>,
        geocoder: Arc<dyn Geocoder>,
        geolocator: Arc<dyn Geolocator>,
        debounce: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = PickerSession {
            picker,
            geocoder,
            geolocator,
            debounce,
            commands: rx,
            tasks: JoinSet::new(),
        };
        Self {
            commands: tx,
            task: tokio::spawn(session.run()),
        }
    }

    pub fn send(&self, event: PickerEvent) -> Result<(), SessionClosed> {
        self.commands
            .send(Command::Event(event))
            .map_err(|_| SessionClosed)
    }

    pub async fn snapshot(&self) -> Result<PickerSnapshot, SessionClosed> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Snapshot(tx))
            .map_err(|_| SessionClosed)?;
        rx.await.map_err(|_| SessionClosed)
    }

    /// Tear the session down and wait until the map has been released.
    pub async fn unmount(self) {
        let _ = self.commands.send(Command::Unmount);
        if let Err(e) = self.task.await {
            warn!(error = %e, "picker session ended abnormally");
        }
    }
}

impl<S: MapSurface, H: PickerHost> PickerSession<S, H> {
    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Event(event)) => self.handle(event),
                    Some(Command::Snapshot(reply)) => {
                        let _ = reply.send(self.snapshot());
                    }
                    Some(Command::Unmount) | None => break,
                },
                Some(joined) = self.tasks.join_next() => match joined {
                    Ok(completion) => self.complete(completion),
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => warn!(error = %e, "picker task failed"),
                },
            }
        }

        self.tasks.shutdown().await;
        self.picker.unmount();
        debug!("picker session closed");
    }

    fn handle(&mut self, event: PickerEvent) {
        match event {
            PickerEvent::Resized(size) => self.picker.container_resized(size),
            PickerEvent::Input(text) => {
                if let Some(request) = self.picker.input_changed(&text) {
                    self.schedule(request);
                }
            }
            PickerEvent::Focus => self.picker.focus(),
            PickerEvent::Blur => self.picker.blur(),
            PickerEvent::Submit => {
                if let Some(request) = self.picker.submit() {
                    self.dispatch(request);
                }
            }
            PickerEvent::PickSuggestion(index) => {
                if !self.picker.pick_suggestion(index) {
                    debug!(index, "no suggestion at index");
                }
            }
            PickerEvent::Click(point) => {
                if !self.picker.map_clicked(point) {
                    debug!("click ignored, map not initialized");
                }
            }
            PickerEvent::UseCurrentLocation => self.locate(),
        }
    }

    fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Debounced(request) => {
                if self.picker.is_pending(&request) {
                    self.dispatch(request);
                } else {
                    debug!(seq = request.seq, "suggestion request superseded during debounce");
                }
            }
            Completion::Lookup(response) => self.picker.lookup_completed(response),
            Completion::Position { epoch, result } => {
                if epoch == self.picker.selection_epoch() {
                    self.picker.geolocation_completed(result);
                } else {
                    debug!("position fix overtaken by a newer selection");
                }
            }
        }
    }

    fn schedule(&mut self, request: LookupRequest) {
        if request.kind != LookupKind::Suggest || self.debounce.is_zero() {
            self.dispatch(request);
            return;
        }
        let delay = self.debounce;
        self.tasks.spawn(async move {
            tokio::time::sleep(delay).await;
            Completion::Debounced(request)
        });
    }

    fn dispatch(&mut self, request: LookupRequest) {
        debug!(seq = request.seq, kind = ?request.kind, query = %request.query, "lookup dispatched");
        let geocoder = Arc::clone(&self.geocoder);
        self.tasks.spawn(async move {
            let fallback = request.clone();
            match tokio::task::spawn_blocking(move || request.run(geocoder.as_ref())).await {
                Ok(response) => Completion::Lookup(response),
                Err(e) => Completion::Lookup(
                    fallback.respond(Err(LocationError::Network(format!("lookup task failed: {}", e)))),
                ),
            }
        });
    }

    fn locate(&mut self) {
        if !self.geolocator.is_supported() {
            self.picker
                .geolocation_completed(Err(GeolocationError::Unsupported));
            return;
        }
        let geolocator = Arc::clone(&self.geolocator);
        let epoch = self.picker.selection_epoch();
        self.tasks.spawn(async move {
            let result = tokio::task::spawn_blocking(move || geolocator.locate())
                .await
                .unwrap_or_else(|e| Err(GeolocationError::Failed(e.to_string())));
            Completion::Position { epoch, result }
        });
    }

    fn snapshot(&self) -> PickerSnapshot {
        let search = self.picker.search();
        PickerSnapshot {
            input: search.input().to_string(),
            suggestions: search.suggestions().to_vec(),
            suggestions_visible: search.is_visible(),
            marker: self.picker.map().marker_position(),
            map_active: self.picker.map().is_active(),
            last_selection: self.picker.last_selection().cloned(),
        }
    }
}
