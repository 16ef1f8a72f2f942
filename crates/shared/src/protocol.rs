use serde::{Deserialize, Serialize};

use crate::domain::{Category, Event};

/// Body of `POST /events`. Only user-settable fields; identity, category,
/// timestamps and the archived flag are assigned by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEventData {
    pub title: String,
    pub date: String,
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body of `PATCH /events/{id}`. Absent fields are left unchanged by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEventData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl UpdateEventData {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListMeta {
    #[serde(default)]
    pub total: Option<usize>,
}

/// Envelope of `GET /events`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventListResponse {
    #[serde(default)]
    pub meta: ListMeta,
    pub result: Vec<Event>,
}

impl EventListResponse {
    pub fn new(result: Vec<Event>) -> Self {
        Self {
            meta: ListMeta {
                total: Some(result.len()),
            },
            result,
        }
    }
}
