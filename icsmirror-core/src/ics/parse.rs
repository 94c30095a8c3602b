//! Feed normalization using the icalendar crate's parser.

use crate::error::{CoreError, CoreResult};
use crate::event::{CalendarEntry, DEFAULT_SUMMARY, EventTime};
use crate::ics::zones::FeedZones;
use crate::timezone;
use chrono::{NaiveDate, NaiveDateTime};
use icalendar::{
    DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};

/// Parse a whole ICS document into normalized entries.
///
/// VEVENTs without a DTSTART are dropped. VTIMEZONE definitions resolve
/// TZIDs nothing else knows; everything else in the calendar (VTODO, ...)
/// is ignored.
pub fn parse_feed(content: &str) -> CoreResult<Vec<CalendarEntry>> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| CoreError::IcsParse(e.to_string()))?;

    let zones = FeedZones::from_components(&calendar.components);
    if !zones.is_empty() {
        tracing::debug!(zones = zones.len(), "Read feed time zone definitions");
    }

    let mut entries = Vec::new();
    let mut dropped = 0usize;

    for component in calendar.components.iter().filter(|c| c.name == "VEVENT") {
        match normalize(component, &zones) {
            Some(entry) => entries.push(entry),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::warn!(dropped, "Skipped malformed VEVENTs without DTSTART");
    }

    Ok(entries)
}

/// Convert one parsed VEVENT into a `CalendarEntry`.
///
/// A missing UID becomes the empty string.
pub fn normalize(vevent: &Component<'_>, zones: &FeedZones) -> Option<CalendarEntry> {
    let uid = vevent
        .find_prop("UID")
        .map(|p| p.val.to_string())
        .unwrap_or_default();
    let start = to_event_time(
        DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?,
        zones,
    );
    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(|dpt| to_event_time(dpt, zones))
        .unwrap_or_else(|| start.clone());

    let summary = text_prop(vevent, "SUMMARY").unwrap_or_else(|| DEFAULT_SUMMARY.to_string());
    let description = text_prop(vevent, "DESCRIPTION").unwrap_or_default();
    let location = text_prop(vevent, "LOCATION").unwrap_or_default();

    let recurrence_rule = vevent.find_prop("RRULE").map(|p| p.val.to_string());
    let exception_dates: Vec<EventTime> = vevent
        .properties
        .iter()
        .filter(|p| p.name == "EXDATE")
        .flat_map(|p| parse_exdate_property(p, zones))
        .collect();

    let recurrence_id = vevent
        .find_prop("RECURRENCE-ID")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(|dpt| to_event_time(dpt, zones));

    Some(CalendarEntry {
        uid,
        summary,
        description,
        location,
        start,
        end,
        recurrence_rule,
        exception_dates,
        recurrence_id,
    })
}

fn text_prop(vevent: &Component<'_>, name: &str) -> Option<String> {
    vevent
        .find_prop(name)
        .map(|p| unescape_text(p.val.as_ref()))
}

/// Undo RFC 5545 TEXT escaping (`\n`, `\,`, `\;`, `\\`).
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Convert icalendar's DatePerhapsTime to our EventTime, preserving timezone info
fn to_event_time(dpt: DatePerhapsTime, zones: &FeedZones) -> EventTime {
    match dpt {
        DatePerhapsTime::Date(d) => EventTime::Date(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            icalendar::CalendarDateTime::Utc(dt) => EventTime::DateTimeUtc(dt),
            icalendar::CalendarDateTime::Floating(naive) => EventTime::DateTimeFloating(naive),
            icalendar::CalendarDateTime::WithTimezone { date_time, tzid } => {
                zoned_time(date_time, tzid, zones)
            }
        },
    }
}

/// A wall-clock time with a TZID. The feed's VTIMEZONE is consulted only
/// when neither the known-zone table nor chrono-tz resolves the TZID.
fn zoned_time(datetime: NaiveDateTime, tzid: String, zones: &FeedZones) -> EventTime {
    if timezone::resolve_tz(&tzid).is_none() {
        if let Some(offset) = zones.offset_at(&tzid, &datetime) {
            return EventTime::DateTimeFeedZone {
                datetime,
                tzid,
                offset,
            };
        }
    }

    EventTime::DateTimeZoned { datetime, tzid }
}

/// Parse an EXDATE property into a list of EventTime values.
///
/// Handles `TZID=` and `VALUE=DATE` parameters, `Z`-suffixed UTC values,
/// floating values and comma-separated lists.
fn parse_exdate_property(prop: &Property<'_>, zones: &FeedZones) -> Vec<EventTime> {
    let tzid = prop
        .params
        .iter()
        .find(|p| p.key == "TZID")
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()));

    let is_date = prop
        .params
        .iter()
        .any(|p| p.key == "VALUE" && p.val.as_ref().map(|v| v.as_ref()) == Some("DATE"));

    prop.val
        .as_ref()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| parse_exdate_value(s, tzid.as_deref(), is_date, zones))
        .collect()
}

fn parse_exdate_value(
    s: &str,
    tzid: Option<&str>,
    is_date: bool,
    zones: &FeedZones,
) -> Option<EventTime> {
    if is_date || s.len() == 8 {
        return NaiveDate::parse_from_str(s, "%Y%m%d").ok().map(EventTime::Date);
    }

    if let Some(naive) = s.strip_suffix('Z') {
        return NaiveDateTime::parse_from_str(naive, "%Y%m%dT%H%M%S")
            .ok()
            .map(|dt| EventTime::DateTimeUtc(dt.and_utc()));
    }

    let datetime = NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S").ok()?;
    Some(match tzid {
        Some(tz) => zoned_time(datetime, tz.to_string(), zones),
        None => EventTime::DateTimeFloating(datetime),
    })
}
