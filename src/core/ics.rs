//! iCalendar output for a built [`Calendar`].

use crate::domain::model::{Calendar, CalendarEvent};
use chrono::{DateTime, FixedOffset, Utc};
use icalendar::{Component, Property};

const LOCAL_FORMAT: &str = "%Y%m%dT%H%M%S";
const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

pub fn to_ics_string(calendar: &Calendar) -> String {
    let mut cal = icalendar::Calendar::new();
    for event in &calendar.events {
        cal.push(event_component(event, &calendar.tzid));
    }
    let cal = cal.done();

    rewrite_calendar_header(&cal.to_string(), calendar)
}

pub fn to_ics_bytes(calendar: &Calendar) -> Vec<u8> {
    to_ics_string(calendar).into_bytes()
}

fn event_component(event: &CalendarEvent, tzid: &str) -> icalendar::Event {
    let mut ics_event = icalendar::Event::new();
    ics_event.uid(&event.uid);
    ics_event.summary(&event.title);
    ics_event.description(&event.description);

    add_zoned_property(&mut ics_event, "DTSTART", &event.start, tzid);
    add_zoned_property(&mut ics_event, "DTEND", &event.end, tzid);

    // DTSTAMP must be UTC
    ics_event.add_property("DTSTAMP", utc_stamp(&event.created));

    // With a TZID on DTSTART, UNTIL has to be given in UTC
    ics_event.add_property(
        "RRULE",
        format!("FREQ=WEEKLY;UNTIL={}", utc_stamp(&event.recurrence.until)),
    );

    ics_event.done()
}

fn add_zoned_property(
    ics_event: &mut icalendar::Event,
    name: &str,
    time: &DateTime<FixedOffset>,
    tzid: &str,
) {
    let mut prop = Property::new(name, time.naive_local().format(LOCAL_FORMAT).to_string());
    prop.add_parameter("TZID", tzid);
    ics_event.append_property(prop);
}

fn utc_stamp(time: &DateTime<FixedOffset>) -> String {
    time.with_timezone(&Utc).format(UTC_FORMAT).to_string()
}

/// Swaps the icalendar crate's VERSION/PRODID for ours and defines the
/// fixed-offset VTIMEZONE ahead of the first event.
fn rewrite_calendar_header(ics: &str, calendar: &Calendar) -> String {
    let timezone = timezone_block(&calendar.tzid, calendar.offset);
    let mut result = String::with_capacity(ics.len() + timezone.len());
    let mut timezone_written = false;

    for line in ics.lines() {
        if line.starts_with("PRODID:") || line.starts_with("VERSION:") {
            continue;
        }

        if !timezone_written && (line == "BEGIN:VEVENT" || line == "END:VCALENDAR") {
            result.push_str(&timezone);
            timezone_written = true;
        }

        result.push_str(line);
        result.push_str("\r\n");

        if line == "BEGIN:VCALENDAR" {
            result.push_str(&format!("VERSION:{}\r\n", calendar.version));
            result.push_str(&format!("PRODID:{}\r\n", calendar.product_id));
        }
    }

    result
}

fn timezone_block(tzid: &str, offset: FixedOffset) -> String {
    let offset = format_utc_offset(offset);
    [
        "BEGIN:VTIMEZONE".to_string(),
        format!("TZID:{}", tzid),
        "BEGIN:STANDARD".to_string(),
        "DTSTART:19700101T000000".to_string(),
        format!("TZOFFSETFROM:{}", offset),
        format!("TZOFFSETTO:{}", offset),
        "END:STANDARD".to_string(),
        "END:VTIMEZONE".to_string(),
    ]
    .iter()
    .map(|line| format!("{}\r\n", line))
    .collect()
}

/// RFC 5545 utc-offset, e.g. `+0800`.
fn format_utc_offset(offset: FixedOffset) -> String {
    let seconds = offset.local_minus_utc();
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.abs() / 60;
    format!("{}{:02}{:02}", sign, minutes / 60, minutes % 60)
}
