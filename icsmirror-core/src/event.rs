//! Canonical in-memory form of feed entries.
//!
//! Every VEVENT from the feed is normalized into a `CalendarEntry`; the
//! reconciler works exclusively with these.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::fmt;

use crate::timezone;

/// Title used when a feed entry has no SUMMARY.
pub const DEFAULT_SUMMARY: &str = "No Title";

/// A normalized feed entry (master or exception occurrence)
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEntry {
    /// Shared by a recurring master and all of its exception occurrences
    pub uid: String,
    pub summary: String,
    pub description: String,
    pub location: String,
    pub start: EventTime,
    pub end: EventTime,

    // Recurrence fields (masters only)
    /// RRULE value, verbatim from the feed
    pub recurrence_rule: Option<String>,
    /// EXDATE values in feed order
    pub exception_dates: Vec<EventTime>,

    /// Original start of the overridden occurrence (RECURRENCE-ID)
    pub recurrence_id: Option<EventTime>,
}

impl CalendarEntry {
    /// An entry overriding one occurrence of a recurring series.
    pub fn is_exception(&self) -> bool {
        self.recurrence_id.is_some()
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence_rule.is_some()
    }

    pub fn is_all_day(&self) -> bool {
        self.start.is_all_day()
    }
}

/// A point in time as written in the feed.
#[derive(Debug, Clone, PartialEq)]
pub enum EventTime {
    /// All-day value, no time of day
    Date(NaiveDate),
    /// `...Z` values
    DateTimeUtc(DateTime<Utc>),
    /// Wall-clock time without zone; read as UTC
    DateTimeFloating(NaiveDateTime),
    /// Wall-clock time with the feed's TZID, kept verbatim
    DateTimeZoned { datetime: NaiveDateTime, tzid: String },
    /// Wall-clock time in a zone only the feed's own VTIMEZONE defines,
    /// with the offset that definition puts in effect at that time
    DateTimeFeedZone {
        datetime: NaiveDateTime,
        tzid: String,
        offset: FixedOffset,
    },
}

impl EventTime {
    pub fn is_all_day(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }

    /// The instant this value denotes, or `None` for all-day values.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            EventTime::Date(_) => None,
            EventTime::DateTimeUtc(dt) => Some(*dt),
            EventTime::DateTimeFloating(dt) => Some(dt.and_utc()),
            EventTime::DateTimeZoned { datetime, tzid } => Some(timezone::localize(datetime, tzid)),
            EventTime::DateTimeFeedZone {
                datetime, offset, ..
            } => offset
                .from_local_datetime(datetime)
                .single()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }

    /// The calendar date in the value's own zone.
    pub fn date(&self) -> NaiveDate {
        match self {
            EventTime::Date(d) => *d,
            EventTime::DateTimeUtc(dt) => dt.date_naive(),
            EventTime::DateTimeFloating(dt) => dt.date(),
            EventTime::DateTimeZoned { datetime, .. }
            | EventTime::DateTimeFeedZone { datetime, .. } => datetime.date(),
        }
    }

    /// Start of the day for all-day values, the instant itself otherwise.
    pub fn start_of_window(&self) -> DateTime<Utc> {
        match self.to_utc() {
            Some(dt) => dt,
            None => self.date().and_time(NaiveTime::MIN).and_utc(),
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::DateTimeUtc(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
            EventTime::DateTimeFloating(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            EventTime::DateTimeZoned { datetime, tzid }
            | EventTime::DateTimeFeedZone { datetime, tzid, .. } => {
                write!(f, "{} ({})", datetime.format("%Y-%m-%dT%H:%M:%S"), tzid)
            }
        }
    }
}
