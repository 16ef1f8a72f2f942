use super::*;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use client_core::{RequestError, RequestFailure, StoreOperation};
use shared::{
    domain::{Category, EventId},
    protocol::{CreateEventData, UpdateEventData},
    validation::FieldError,
};

/// Serves a fixed list, or fails every call when `events` is `None`.
struct FixedStore {
    events: Option<Vec<Event>>,
}

impl FixedStore {
    fn failure(operation: StoreOperation) -> RequestError {
        RequestError::new(operation, RequestFailure::Status(503))
    }
}

#[async_trait]
impl EventStore for FixedStore {
    async fn list_events(&self) -> Result<Vec<Event>, RequestError> {
        self.events
            .clone()
            .ok_or_else(|| Self::failure(StoreOperation::Fetch))
    }

    async fn create_event(&self, _data: &CreateEventData) -> Result<Event, RequestError> {
        Err(Self::failure(StoreOperation::Create))
    }

    async fn update_event(
        &self,
        _id: &EventId,
        _data: &UpdateEventData,
    ) -> Result<Event, RequestError> {
        Err(Self::failure(StoreOperation::Update))
    }

    async fn archive_event(&self, _id: &EventId) -> Result<Event, RequestError> {
        Err(Self::failure(StoreOperation::Archive))
    }

    async fn delete_event(&self, _id: &EventId) -> Result<(), RequestError> {
        Err(Self::failure(StoreOperation::Delete))
    }
}

fn event(id: &str, title: &str, date: &str, time: &str, archived: bool) -> Event {
    let stamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Event {
        id: EventId::from(id),
        title: title.to_string(),
        date: date.to_string(),
        time: time.to_string(),
        notes: None,
        category: Category::Work,
        archived,
        created_at: stamp,
        updated_at: stamp,
    }
}

#[tokio::test]
async fn lists_visible_events_in_order() {
    let mut review = event("b", "Review", "2024-03-02", "14:00", false);
    review.notes = Some("bring slides\nroom 4".to_string());
    let store = FixedStore {
        events: Some(vec![
            review,
            event("a", "Standup", "2024-03-01", "09:00", false),
            event("z", "Old", "2023-01-01", "08:00", true),
        ]),
    };
    let controller = EventCollectionController::mount(store, EventView::Scheduled).await;

    let out = render(&controller);
    assert_eq!(
        out,
        "Event Scheduler\n\
         ===============\n\
         2024-03-01 09:00  Work      Standup  [a]\n\
         2024-03-02 14:00  Work      Review  [b]\n    \
         bring slides\n    \
         room 4\n\
         \n\
         2 events\n"
    );
}

#[tokio::test]
async fn archive_view_only_shows_archived_events() {
    let store = FixedStore {
        events: Some(vec![
            event("a", "Standup", "2024-03-01", "09:00", false),
            event("z", "Old", "2023-01-01", "08:00", true),
        ]),
    };
    let controller = EventCollectionController::mount(store, EventView::Archived).await;

    let out = render(&controller);
    assert!(out.starts_with("Archived Events\n===============\n"));
    assert!(out.contains("Old  [z]"));
    assert!(!out.contains("Standup"));
    assert!(out.ends_with("\n1 event\n"));
}

#[tokio::test]
async fn empty_views_say_so() {
    let scheduled = EventCollectionController::mount(
        FixedStore { events: Some(Vec::new()) },
        EventView::Scheduled,
    )
    .await;
    assert!(render(&scheduled).contains("No events scheduled."));

    let archived = EventCollectionController::mount(
        FixedStore { events: Some(Vec::new()) },
        EventView::Archived,
    )
    .await;
    assert!(render(&archived).ends_with("No archived events.\n"));
}

#[test]
fn unmounted_controller_renders_loading() {
    let controller = EventCollectionController::new(FixedStore { events: None }, EventView::Archived);
    assert!(render(&controller).ends_with("Loading archived events...\n"));
}

#[tokio::test]
async fn failed_fetch_shows_error_banner() {
    let controller =
        EventCollectionController::mount(FixedStore { events: None }, EventView::Scheduled).await;

    let out = render(&controller);
    assert!(out.contains("! Failed to fetch events\n"), "{out}");
    assert!(out.contains("No events scheduled."));
}

#[test]
fn form_errors_render_one_per_line() {
    let errors = ValidationErrors(vec![
        FieldError {
            field: "title".to_string(),
            message: "Title is required".to_string(),
        },
        FieldError {
            field: "time".to_string(),
            message: "Time must be HH:MM".to_string(),
        },
    ]);
    assert_eq!(
        render_form_errors(&errors),
        "title: Title is required\ntime: Time must be HH:MM\n"
    );
}
