//! Chronological ordering of events by their combined date and time.

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use shared::domain::Event;

const INSTANT_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// The instant an event is scheduled for, or `None` when its date or time is
/// missing or malformed.
pub fn event_instant(event: &Event) -> Option<NaiveDateTime> {
    let stamp = format!("{}T{}", event.date.trim(), event.time.trim());
    INSTANT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&stamp, format).ok())
}

/// Earlier events first. A pair where either side is unorderable compares equal.
pub fn compare(a: &Event, b: &Event) -> Ordering {
    match (event_instant(a), event_instant(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => Ordering::Equal,
    }
}

/// Stable chronological sort.
///
/// An unorderable event compares equal to everything, which is not a total order,
/// so it is treated as a fixed partition point: it keeps its index and only the runs
/// of orderable events between such points are sorted. This is the arrangement a
/// stable insertion sort driven by [`compare`] produces.
pub fn sort_events(events: &mut [Event]) {
    let orderable: Vec<bool> = events
        .iter()
        .map(|event| event_instant(event).is_some())
        .collect();

    let mut start = 0;
    while start < events.len() {
        if !orderable[start] {
            start += 1;
            continue;
        }
        let end = orderable[start..]
            .iter()
            .position(|ok| !ok)
            .map_or(events.len(), |offset| start + offset);
        events[start..end].sort_by(compare);
        start = end;
    }
}

#[cfg(test)]
#[path = "tests/ordering_tests.rs"]
mod tests;
