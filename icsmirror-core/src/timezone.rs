//! Mapping of feed time zone identifiers.
//!
//! Feeds exported from Exchange carry Windows zone names ("Russian Standard
//! Time") while others carry IANA names. The remote calendar only ever gets
//! a zone name from the small table below; anything else is sent as UTC.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Zones with a known remote name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownZone {
    Moscow,
    Shanghai,
    Utc,
}

/// Remote zone name used when a feed zone is not in the table.
pub const FALLBACK_ZONE_NAME: &str = "UTC";

/// Source identifiers recognized by `KnownZone::from_tzid`.
const SOURCE_ZONES: &[(&str, KnownZone)] = &[
    ("Europe/Moscow", KnownZone::Moscow),
    ("Russian Standard Time", KnownZone::Moscow),
    ("China Standard Time", KnownZone::Shanghai),
    ("UTC", KnownZone::Utc),
];

impl KnownZone {
    /// Look up a feed TZID in the table. Surrounding quotes are ignored.
    pub fn from_tzid(tzid: &str) -> Option<Self> {
        let tzid = tzid.trim().trim_matches('"');
        SOURCE_ZONES
            .iter()
            .find(|(name, _)| *name == tzid)
            .map(|(_, zone)| *zone)
    }

    pub fn iana_name(self) -> &'static str {
        match self {
            KnownZone::Moscow => "Europe/Moscow",
            KnownZone::Shanghai => "Asia/Shanghai",
            KnownZone::Utc => "UTC",
        }
    }

    pub fn tz(self) -> Tz {
        match self {
            KnownZone::Moscow => chrono_tz::Europe::Moscow,
            KnownZone::Shanghai => chrono_tz::Asia::Shanghai,
            KnownZone::Utc => chrono_tz::UTC,
        }
    }
}

/// Zone name to send to the remote service for a feed TZID.
pub fn remote_zone_name(tzid: &str) -> &'static str {
    KnownZone::from_tzid(tzid)
        .map(KnownZone::iana_name)
        .unwrap_or(FALLBACK_ZONE_NAME)
}

/// Resolve a feed TZID for computing absolute instants.
///
/// Table entries win, then any IANA name chrono-tz knows. Returns `None`
/// for zones that cannot be resolved; callers treat those as UTC.
pub fn resolve_tz(tzid: &str) -> Option<Tz> {
    KnownZone::from_tzid(tzid)
        .map(KnownZone::tz)
        .or_else(|| tzid.trim().trim_matches('"').parse::<Tz>().ok())
}

/// Interpret a wall-clock time in the given feed zone as an instant.
///
/// Ambiguous times (DST fold) take the earlier instant. Times inside a DST
/// gap and unresolvable zones fall back to reading the wall clock as UTC.
pub fn localize(datetime: &NaiveDateTime, tzid: &str) -> DateTime<Utc> {
    resolve_tz(tzid)
        .and_then(|tz| tz.from_local_datetime(datetime).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| datetime.and_utc())
}
