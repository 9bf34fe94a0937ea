//! Past/upcoming split of the event list.

use crate::model::event::Event;
use std::time::{SystemTime, UNIX_EPOCH};

/// List section an event is rendered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSection {
    Past,
    Upcoming,
}

impl EventSection {
    /// Section header shown above the rows.
    pub fn title(self) -> &'static str {
        match self {
            Self::Past => "Past Events",
            Self::Upcoming => "Coming Up Events",
        }
    }
}

/// Events partitioned around a reference instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventTimeline {
    /// `starts_at < now`, in input order.
    pub past: Vec<Event>,
    /// `starts_at >= now`, in input order.
    pub upcoming: Vec<Event>,
}

impl EventTimeline {
    pub fn section(&self, section: EventSection) -> &[Event] {
        match section {
            EventSection::Past => &self.past,
            EventSection::Upcoming => &self.upcoming,
        }
    }

    pub fn len(&self) -> usize {
        self.past.len() + self.upcoming.len()
    }

    pub fn is_empty(&self) -> bool {
        self.past.is_empty() && self.upcoming.is_empty()
    }
}

/// Splits `events` into past and upcoming relative to `now_ms`.
///
/// An event starting exactly at `now_ms` is upcoming.
pub fn categorize_events(events: impl IntoIterator<Item = Event>, now_ms: i64) -> EventTimeline {
    let (past, upcoming): (Vec<Event>, Vec<Event>) = events
        .into_iter()
        .partition(|event: &Event| event.is_past(now_ms));
    EventTimeline { past, upcoming }
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
