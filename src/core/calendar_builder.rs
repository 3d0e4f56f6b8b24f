use crate::core::ics;
use crate::core::weekday::WeekdayOffsets;
use crate::domain::model::{
    Calendar, CalendarEvent, ClassSession, DateRange, Timetable, WeeklyRecurrence,
};
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;
use std::io::Read;

/// Malaysian Standard Time, UTC+8 with no daylight saving.
pub const UTC_OFFSET_SECONDS: i32 = 8 * 3600;
pub const DEFAULT_TZID: &str = "Asia/Kuala_Lumpur";
pub const DEFAULT_PRODUCT_ID: &str = "-//mmu-ics//MMU Timetable Export//EN";
pub const CALENDAR_VERSION: &str = "2.0";

pub fn malaysia_offset() -> FixedOffset {
    FixedOffset::east_opt(UTC_OFFSET_SECONDS).expect("UTC+8 is a valid fixed offset")
}

/// The timetable shapes the builder accepts.
pub enum TimetableInput {
    Structured(Timetable),
    Json(String),
    Reader(Box<dyn Read + Send>),
}

impl TimetableInput {
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        TimetableInput::Reader(Box::new(reader))
    }

    pub fn into_timetable(self) -> Result<Timetable> {
        match self {
            TimetableInput::Structured(timetable) => Ok(timetable),
            TimetableInput::Json(text) => timetable_from_value(serde_json::from_str(&text)?),
            TimetableInput::Reader(reader) => {
                timetable_from_value(serde_json::from_reader(reader)?)
            }
        }
    }
}

impl std::fmt::Debug for TimetableInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimetableInput::Structured(timetable) => f
                .debug_tuple("Structured")
                .field(&timetable.session_count())
                .finish(),
            TimetableInput::Json(text) => f.debug_tuple("Json").field(&text.len()).finish(),
            TimetableInput::Reader(_) => f.write_str("Reader"),
        }
    }
}

impl From<Timetable> for TimetableInput {
    fn from(timetable: Timetable) -> Self {
        TimetableInput::Structured(timetable)
    }
}

impl From<String> for TimetableInput {
    fn from(text: String) -> Self {
        TimetableInput::Json(text)
    }
}

impl From<&str> for TimetableInput {
    fn from(text: &str) -> Self {
        TimetableInput::Json(text.to_string())
    }
}

/// Dispatches an untyped value: a list is a structured timetable, a string is JSON text.
impl TryFrom<Value> for TimetableInput {
    type Error = EtlError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(text) => Ok(TimetableInput::Json(text)),
            Value::Array(_) => Ok(TimetableInput::Structured(serde_json::from_value(value)?)),
            other => Err(EtlError::InputTypeError {
                expected: "a list of day groups or JSON text".to_string(),
                found: json_kind(&other).to_string(),
            }),
        }
    }
}

fn timetable_from_value(value: Value) -> Result<Timetable> {
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        other => Err(EtlError::InputTypeError {
            expected: "a JSON list of day groups".to_string(),
            found: json_kind(&other).to_string(),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone)]
pub struct CalendarBuilder {
    product_id: String,
    tzid: String,
    offset: FixedOffset,
    created: Option<DateTime<FixedOffset>>,
}

impl Default for CalendarBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PRODUCT_ID, DEFAULT_TZID)
    }
}

impl CalendarBuilder {
    pub fn new(product_id: impl Into<String>, tzid: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            tzid: tzid.into(),
            offset: malaysia_offset(),
            created: None,
        }
    }

    /// Pins DTSTAMP instead of reading the clock.
    pub fn created_at(mut self, created: DateTime<FixedOffset>) -> Self {
        self.created = Some(created.with_timezone(&self.offset));
        self
    }

    pub fn build(
        &self,
        input: impl Into<TimetableInput>,
        start: NaiveDate,
        stop: NaiveDate,
    ) -> Result<Vec<u8>> {
        let calendar = self.build_calendar(input, DateRange::new(start, stop))?;
        Ok(ics::to_ics_bytes(&calendar))
    }

    pub fn build_calendar(
        &self,
        input: impl Into<TimetableInput>,
        range: DateRange,
    ) -> Result<Calendar> {
        let timetable = input.into().into_timetable()?;
        let offsets = WeekdayOffsets::from_start(range.start);
        let created = self
            .created
            .unwrap_or_else(|| Utc::now().with_timezone(&self.offset));
        let until = self.localize(end_of_day(range.stop))?;

        let mut events = Vec::with_capacity(timetable.session_count());
        for session in timetable.sessions() {
            let date = offsets.first_occurrence(&session.day)?;
            if date > range.stop {
                tracing::debug!(
                    "Skipping {} on {}: first occurrence {} is after {}",
                    session.subject_code,
                    session.day,
                    date,
                    range.stop
                );
                continue;
            }

            let start = self.localize(date.and_time(parse_time("start", &session.start)?))?;
            let end = self.localize(date.and_time(parse_time("end", &session.end)?))?;

            events.push(CalendarEvent {
                uid: event_uid(session),
                title: format!("{} {}", session.subject_code, session.subject_name),
                description: format!("{} - {}", session.section, session.venue),
                start,
                end,
                created,
                recurrence: WeeklyRecurrence { until },
            });
        }

        tracing::debug!(
            "Built {} events from {} class sessions",
            events.len(),
            timetable.session_count()
        );

        Ok(Calendar {
            product_id: self.product_id.clone(),
            version: CALENDAR_VERSION.to_string(),
            tzid: self.tzid.clone(),
            offset: self.offset,
            events,
        })
    }

    fn localize(&self, local: NaiveDateTime) -> Result<DateTime<FixedOffset>> {
        local
            .and_local_timezone(self.offset)
            .single()
            .ok_or_else(|| EtlError::CalendarError {
                message: format!("{} cannot be expressed at offset {}", local, self.offset),
            })
    }
}

/// Builds an iCalendar document with the default product id and timezone.
pub fn build(
    input: impl Into<TimetableInput>,
    start: NaiveDate,
    stop: NaiveDate,
) -> Result<Vec<u8>> {
    CalendarBuilder::default().build(input, start, stop)
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))
}

fn parse_time(field: &str, value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|e| EtlError::MalformedRecordError {
            field: field.to_string(),
            value: value.to_string(),
            reason: format!("expected HH:MM ({})", e),
        })
}

fn event_uid(session: &ClassSession) -> String {
    let parts = [
        session.strm.as_str(),
        session.subject_code.as_str(),
        session.class_type.as_str(),
        session.section.as_str(),
        session.day.as_str(),
        session.start.as_str(),
    ];
    let key = parts
        .iter()
        .map(|part| {
            part.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-");
    format!("{}@mmu-ics", key)
}
