//! Text rendering of the scheduler and archive views.

use std::fmt::Write as _;

use client_core::{EventCollectionController, EventStore, EventView};
use shared::{domain::Event, validation::ValidationErrors};

pub fn render<S: EventStore>(controller: &EventCollectionController<S>) -> String {
    let view = controller.view();
    let mut out = String::new();
    let title = view.title();
    let _ = writeln!(out, "{title}\n{}", "=".repeat(title.len()));

    if let Some(error) = controller.error() {
        let _ = writeln!(out, "! {error}");
    }

    if controller.loading() {
        let _ = writeln!(out, "{}", loading_message(view));
        return out;
    }

    let visible: Vec<&Event> = controller.visible().collect();
    if visible.is_empty() {
        let _ = writeln!(out, "{}", empty_message(view));
        return out;
    }

    for event in &visible {
        render_event(&mut out, event);
    }
    let noun = if visible.len() == 1 { "event" } else { "events" };
    let _ = writeln!(out, "\n{} {noun}", visible.len());
    out
}

fn render_event(out: &mut String, event: &Event) {
    let _ = writeln!(
        out,
        "{} {:<5}  {:<8}  {}  [{}]",
        event.date, event.time, event.category, event.title, event.id
    );
    if let Some(notes) = event.notes.as_deref().filter(|notes| !notes.is_empty()) {
        for line in notes.lines() {
            let _ = writeln!(out, "    {line}");
        }
    }
}

fn loading_message(view: EventView) -> &'static str {
    match view {
        EventView::Scheduled => "Loading events...",
        EventView::Archived => "Loading archived events...",
    }
}

fn empty_message(view: EventView) -> &'static str {
    match view {
        EventView::Scheduled => "No events scheduled. Add one with `scheduler add`.",
        EventView::Archived => "No archived events.",
    }
}

/// Field errors as the event form would show them, one per line.
pub fn render_form_errors(errors: &ValidationErrors) -> String {
    errors
        .0
        .iter()
        .map(|error| format!("{}: {}\n", error.field, error.message))
        .collect()
}

#[cfg(test)]
#[path = "tests/views_tests.rs"]
mod tests;
