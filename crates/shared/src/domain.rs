use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Classification assigned by the event service. Clients never choose it on create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    Work,
    Personal,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Work, Category::Personal, Category::Other];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Work => "Work",
            Category::Personal => "Personal",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A scheduled event as owned by the remote store.
///
/// `date` and `time` are kept exactly as the store returned them; an event whose
/// date/time pair does not parse is still a valid event, it just cannot be ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "WireEvent")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub date: String,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub category: Category,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Decoding shape for [`Event`]. Upstream payloads carry the identity as `_id`,
/// `id`, or both; decoding collapses them into the single `id` field.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent {
    #[serde(default, rename = "_id")]
    legacy_id: Option<EventId>,
    #[serde(default)]
    id: Option<EventId>,
    title: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    category: Category,
    #[serde(default)]
    archived: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WireEvent> for Event {
    type Error = String;

    fn try_from(wire: WireEvent) -> Result<Self, Self::Error> {
        let id = wire
            .id
            .or(wire.legacy_id)
            .filter(|id| !id.0.is_empty())
            .ok_or_else(|| "event payload carries neither `id` nor `_id`".to_string())?;
        Ok(Self {
            id,
            title: wire.title,
            date: wire.date.unwrap_or_default(),
            time: wire.time.unwrap_or_default(),
            notes: wire.notes,
            category: wire.category,
            archived: wire.archived,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        })
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
