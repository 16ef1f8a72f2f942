use shared::{
    domain::{Category, Event, EventId},
    error::{ApiError, ErrorCode},
    protocol::{CreateEventData, EventListResponse, UpdateEventData},
    validation::{validate_create, validate_update},
};
use storage::{NewEvent, Storage};
use tracing::{debug, error};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

const WORK_KEYWORDS: &[&str] = &[
    "meeting", "standup", "stand-up", "review", "deadline", "client", "project", "sprint",
    "report", "interview", "presentation", "call", "office", "demo", "retro",
];

const PERSONAL_KEYWORDS: &[&str] = &[
    "birthday", "dinner", "lunch", "gym", "doctor", "dentist", "family", "party", "friend",
    "anniversary", "vacation", "holiday", "workout", "date", "wedding", "movie",
];

/// Assigns a category from the words of the title and notes. Work keywords win over
/// personal ones; anything unmatched is `Other`.
pub fn classify_category(title: &str, notes: Option<&str>) -> Category {
    let text = match notes {
        Some(notes) => format!("{title} {notes}"),
        None => title.to_string(),
    }
    .to_lowercase();
    let words: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|word| !word.is_empty())
        .collect();

    let mentions = |keywords: &[&str]| keywords.iter().any(|keyword| words.contains(keyword));
    if mentions(WORK_KEYWORDS) {
        Category::Work
    } else if mentions(PERSONAL_KEYWORDS) {
        Category::Personal
    } else {
        Category::Other
    }
}

pub async fn list_events(ctx: &ApiContext) -> Result<EventListResponse, ApiError> {
    let events = ctx.storage.list_events().await.map_err(internal)?;
    Ok(EventListResponse::new(events))
}

pub async fn create_event(ctx: &ApiContext, data: CreateEventData) -> Result<Event, ApiError> {
    validate_create(&data)?;
    let title = data.title.trim();
    let notes = data
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|notes| !notes.is_empty());
    let category = classify_category(title, notes);

    let event = ctx
        .storage
        .insert_event(NewEvent {
            title,
            date: &data.date,
            time: &data.time,
            notes,
            category,
        })
        .await
        .map_err(internal)?;
    debug!(id = %event.id, %category, "event created");
    Ok(event)
}

pub async fn update_event(
    ctx: &ApiContext,
    id: &EventId,
    mut data: UpdateEventData,
) -> Result<Event, ApiError> {
    validate_update(&data)?;
    if let Some(title) = data.title.as_mut() {
        *title = title.trim().to_string();
    }
    ctx.storage
        .update_event(id, &data)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found(id))
}

/// Flips the archived flag; there is no way to request a specific target state.
pub async fn toggle_archive(ctx: &ApiContext, id: &EventId) -> Result<Event, ApiError> {
    let event = ctx
        .storage
        .toggle_archived(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found(id))?;
    debug!(%id, archived = event.archived, "archive flag toggled");
    Ok(event)
}

pub async fn delete_event(ctx: &ApiContext, id: &EventId) -> Result<(), ApiError> {
    if ctx.storage.delete_event(id).await.map_err(internal)? {
        Ok(())
    } else {
        Err(ApiError::not_found(id))
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    error!(error = %err, "event storage failure");
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
