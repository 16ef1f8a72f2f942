//! Field rules for event forms, shared by the scheduler front end and the event service.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::{CreateEventData, UpdateEventData};

pub const TITLE_MAX_CHARS: usize = 100;
pub const NOTES_MAX_CHARS: usize = 500;
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_messages(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn validate_create(data: &CreateEventData) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();
    check_title(&data.title, &mut errors);
    check_date(&data.date, &mut errors);
    check_time(&data.time, &mut errors);
    if let Some(notes) = &data.notes {
        check_notes(notes, &mut errors);
    }
    finish(errors)
}

pub fn validate_update(data: &UpdateEventData) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();
    if let Some(title) = &data.title {
        check_title(title, &mut errors);
    }
    if let Some(date) = &data.date {
        check_date(date, &mut errors);
    }
    if let Some(time) = &data.time {
        check_time(time, &mut errors);
    }
    if let Some(notes) = &data.notes {
        check_notes(notes, &mut errors);
    }
    finish(errors)
}

fn finish(errors: Vec<FieldError>) -> Result<(), ValidationErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

fn check_title(title: &str, errors: &mut Vec<FieldError>) {
    if title.trim().is_empty() {
        errors.push(FieldError::new("title", "Title is required"));
    } else if title.chars().count() > TITLE_MAX_CHARS {
        errors.push(FieldError::new(
            "title",
            "Title cannot exceed 100 characters",
        ));
    }
}

fn check_date(date: &str, errors: &mut Vec<FieldError>) {
    if date.trim().is_empty() {
        errors.push(FieldError::new("date", "Date is required"));
    } else if !is_canonical_date(date) {
        errors.push(FieldError::new("date", "Date must be YYYY-MM-DD"));
    }
}

fn check_time(time: &str, errors: &mut Vec<FieldError>) {
    if time.trim().is_empty() {
        errors.push(FieldError::new("time", "Time is required"));
    } else if !is_canonical_time(time) {
        errors.push(FieldError::new("time", "Time must be HH:MM"));
    }
}

/// chrono accepts single-digit fields, so the parsed value must format back to the input.
fn is_canonical_date(date: &str) -> bool {
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .is_ok_and(|parsed| parsed.format(DATE_FORMAT).to_string() == date)
}

fn is_canonical_time(time: &str) -> bool {
    NaiveTime::parse_from_str(time, TIME_FORMAT)
        .is_ok_and(|parsed| parsed.format(TIME_FORMAT).to_string() == time)
}

fn check_notes(notes: &str, errors: &mut Vec<FieldError>) {
    if notes.chars().count() > NOTES_MAX_CHARS {
        errors.push(FieldError::new(
            "notes",
            "Notes cannot exceed 500 characters",
        ));
    }
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
