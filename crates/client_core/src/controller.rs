//! Per-view owner of the in-memory event collection.
//!
//! The controller is the single writer of its collection. Store failures never
//! escape it: they are logged, turned into a static user-facing message, and the
//! collection is left exactly as it was before the call.

use shared::{
    domain::{Event, EventId},
    protocol::{CreateEventData, UpdateEventData},
};
use tracing::{debug, warn};

use crate::{
    ordering::sort_events,
    store::{EventStore, RequestError},
};

pub const FETCH_FAILED: &str = "Failed to fetch events";
pub const CREATE_FAILED: &str = "Failed to create event";
pub const UPDATE_FAILED: &str = "Failed to update event";
pub const ARCHIVE_FAILED: &str = "Failed to archive event";
pub const UNARCHIVE_FAILED: &str = "Failed to unarchive event";
pub const DELETE_FAILED: &str = "Failed to delete event";

/// Which partition of the collection a view presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventView {
    Scheduled,
    Archived,
}

impl EventView {
    pub fn includes(self, event: &Event) -> bool {
        event.archived == (self == EventView::Archived)
    }

    pub fn title(self) -> &'static str {
        match self {
            EventView::Scheduled => "Event Scheduler",
            EventView::Archived => "Archived Events",
        }
    }
}

/// User intents a view forwards to its controller.
#[derive(Debug, Clone, PartialEq)]
pub enum EventIntent {
    Refresh,
    Create(CreateEventData),
    Update { id: EventId, data: UpdateEventData },
    Archive(EventId),
    Unarchive(EventId),
    Delete(EventId),
}

impl EventIntent {
    pub fn name(&self) -> &'static str {
        match self {
            EventIntent::Refresh => "refresh",
            EventIntent::Create(_) => "create",
            EventIntent::Update { .. } => "update",
            EventIntent::Archive(_) => "archive",
            EventIntent::Unarchive(_) => "unarchive",
            EventIntent::Delete(_) => "delete",
        }
    }
}

/// Clears the loading flag on every exit path of a refresh, including early drop of
/// the future.
struct LoadingGuard<'a>(&'a mut bool);

impl<'a> LoadingGuard<'a> {
    fn engage(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

fn record_failure(slot: &mut Option<String>, message: &'static str, err: &RequestError) {
    warn!(operation = %err.operation, error = %err, "{message}");
    *slot = Some(message.to_string());
}

pub struct EventCollectionController<S> {
    store: S,
    view: EventView,
    events: Vec<Event>,
    loading: bool,
    error: Option<String>,
}

impl<S: EventStore> EventCollectionController<S> {
    /// A controller that has not fetched yet: loading, empty, no error.
    pub fn new(store: S, view: EventView) -> Self {
        Self {
            store,
            view,
            events: Vec::new(),
            loading: true,
            error: None,
        }
    }

    /// Builds a controller and performs the initial fetch.
    pub async fn mount(store: S, view: EventView) -> Self {
        let mut controller = Self::new(store, view);
        controller.refresh().await;
        controller
    }

    pub fn view(&self) -> EventView {
        self.view
    }

    /// The whole synchronized collection in chronological order, both partitions.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// The ordered events belonging to this controller's view.
    pub fn visible(&self) -> impl Iterator<Item = &Event> + '_ {
        let view = self.view;
        self.events.iter().filter(move |event| view.includes(event))
    }

    pub fn find(&self, id: &EventId) -> Option<&Event> {
        self.events.iter().find(|event| &event.id == id)
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub async fn dispatch(&mut self, intent: EventIntent) {
        debug!(intent = intent.name(), view = ?self.view, "dispatching intent");
        match intent {
            EventIntent::Refresh => self.refresh().await,
            EventIntent::Create(data) => self.create(data).await,
            EventIntent::Update { id, data } => self.update(&id, data).await,
            EventIntent::Archive(id) => self.archive(&id).await,
            EventIntent::Unarchive(id) => self.unarchive(&id).await,
            EventIntent::Delete(id) => self.delete(&id).await,
        }
    }

    /// Replaces the collection with the store's; on failure the stale collection stays.
    pub async fn refresh(&mut self) {
        let _loading = LoadingGuard::engage(&mut self.loading);
        match self.store.list_events().await {
            Ok(mut events) => {
                sort_events(&mut events);
                debug!(count = events.len(), "event collection refreshed");
                self.events = events;
                self.error = None;
            }
            Err(err) => record_failure(&mut self.error, FETCH_FAILED, &err),
        }
    }

    pub async fn create(&mut self, data: CreateEventData) {
        match self.store.create_event(&data).await {
            Ok(event) => {
                debug!(id = %event.id, "event created");
                self.events.push(event);
                sort_events(&mut self.events);
            }
            Err(err) => record_failure(&mut self.error, CREATE_FAILED, &err),
        }
    }

    /// Replaces the matching event in place, then re-sorts since date and time are
    /// updatable.
    pub async fn update(&mut self, id: &EventId, data: UpdateEventData) {
        match self.store.update_event(id, &data).await {
            Ok(event) => {
                self.replace(id, event);
                sort_events(&mut self.events);
            }
            Err(err) => record_failure(&mut self.error, UPDATE_FAILED, &err),
        }
    }

    /// Toggles the archived flag; the store offers no way to request a target state.
    pub async fn archive(&mut self, id: &EventId) {
        self.toggle_archived(id, ARCHIVE_FAILED).await;
    }

    /// Same store call as [`Self::archive`]; only the failure message differs.
    pub async fn unarchive(&mut self, id: &EventId) {
        self.toggle_archived(id, UNARCHIVE_FAILED).await;
    }

    pub async fn delete(&mut self, id: &EventId) {
        match self.store.delete_event(id).await {
            Ok(()) => {
                let before = self.events.len();
                self.events.retain(|event| &event.id != id);
                debug!(%id, removed = before - self.events.len(), "event deleted");
            }
            Err(err) => record_failure(&mut self.error, DELETE_FAILED, &err),
        }
    }

    async fn toggle_archived(&mut self, id: &EventId, failure: &'static str) {
        match self.store.archive_event(id).await {
            Ok(event) => {
                debug!(%id, archived = event.archived, "archive flag toggled");
                self.replace(id, event);
                sort_events(&mut self.events);
            }
            Err(err) => record_failure(&mut self.error, failure, &err),
        }
    }

    fn replace(&mut self, id: &EventId, updated: Event) {
        let mut matched = false;
        for event in self.events.iter_mut().filter(|event| &event.id == id) {
            *event = updated.clone();
            matched = true;
        }
        if !matched {
            debug!(%id, "store returned an event that is no longer in the collection");
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
