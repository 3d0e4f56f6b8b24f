use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// One weekly class meeting, exactly as the timetable API returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSession {
    pub day: String,
    pub start: String,
    pub end: String,
    pub subject_name: String,
    pub subject_code: String,
    #[serde(rename = "type", default)]
    pub class_type: String,
    pub venue: String,
    pub section: String,
    #[serde(default)]
    pub strm: String,
}

/// A term's sessions grouped by day, in API order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timetable {
    pub days: Vec<Vec<ClassSession>>,
}

impl Timetable {
    pub fn new(days: Vec<Vec<ClassSession>>) -> Self {
        Self { days }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Day-group order outer, within-day order inner.
    pub fn sessions(&self) -> impl Iterator<Item = &ClassSession> {
        self.days.iter().flatten()
    }

    pub fn session_count(&self) -> usize {
        self.days.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.session_count() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub stop: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, stop: NaiveDate) -> Self {
        Self { start, stop }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyRecurrence {
    pub until: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub uid: String,
    pub title: String,
    pub description: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub created: DateTime<FixedOffset>,
    pub recurrence: WeeklyRecurrence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    pub product_id: String,
    pub version: String,
    pub tzid: String,
    pub offset: FixedOffset,
    pub events: Vec<CalendarEvent>,
}
