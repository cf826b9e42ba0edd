use serde::{Deserialize, Serialize};

/// Start or end of an event, either a timestamp or an all-day date
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct EventTime {
    #[serde(rename = "dateTime", default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Calendar event as returned by the events listing
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start: Option<EventTime>,
    #[serde(default)]
    pub end: Option<EventTime>,
}

/// One page of the events listing
#[derive(Debug, Clone, Deserialize, Default)]
pub struct EventsPage {
    #[serde(default)]
    pub items: Vec<CalendarEvent>,
    #[serde(rename = "nextPageToken", default)]
    pub next_page_token: Option<String>,
}

/// The parts of an event the digest needs
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProjectedEvent {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl From<CalendarEvent> for ProjectedEvent {
    fn from(event: CalendarEvent) -> Self {
        Self {
            title: event.summary,
            description: event.description,
        }
    }
}
