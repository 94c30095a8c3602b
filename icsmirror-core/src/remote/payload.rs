//! Conversion of feed entries into remote request bodies.

use chrono::TimeZone;

use crate::event::{CalendarEntry, EventTime};
use crate::remote::{EventPayload, OccurrencePatch, RemoteTime, SyncTags};
use crate::timezone::{self, FALLBACK_ZONE_NAME};

impl EventPayload {
    /// Body for creating or replacing the remote copy of a master entry.
    pub fn for_master(entry: &CalendarEntry, sync_marker: &str) -> Self {
        EventPayload {
            summary: entry.summary.clone(),
            description: entry.description.clone(),
            location: entry.location.clone(),
            start: to_remote_time(&entry.start),
            end: to_remote_time(&entry.end),
            recurrence: recurrence_block(entry),
            tags: SyncTags {
                uid: entry.uid.clone(),
                sync_marker: sync_marker.to_string(),
            },
        }
    }
}

impl OccurrencePatch {
    /// Override fields of an exception occurrence. Recurrence never applies here.
    pub fn for_exception(entry: &CalendarEntry) -> Self {
        OccurrencePatch {
            summary: entry.summary.clone(),
            description: entry.description.clone(),
            location: entry.location.clone(),
            start: to_remote_time(&entry.start),
            end: to_remote_time(&entry.end),
        }
    }
}

/// Convert a feed time into the remote representation.
///
/// Timed values carry their real UTC offset, from the feed's own VTIMEZONE
/// when nothing else resolves the zone. The zone name comes from the
/// known-zone table and is `UTC` for everything else.
pub fn to_remote_time(time: &EventTime) -> RemoteTime {
    match time {
        EventTime::Date(d) => RemoteTime::Date(*d),
        EventTime::DateTimeUtc(dt) => RemoteTime::DateTime {
            date_time: dt.fixed_offset(),
            time_zone: FALLBACK_ZONE_NAME.to_string(),
        },
        EventTime::DateTimeFloating(dt) => RemoteTime::DateTime {
            date_time: dt.and_utc().fixed_offset(),
            time_zone: FALLBACK_ZONE_NAME.to_string(),
        },
        EventTime::DateTimeZoned { datetime, tzid } => {
            let date_time = timezone::resolve_tz(tzid)
                .and_then(|tz| tz.from_local_datetime(datetime).earliest())
                .map(|dt| dt.fixed_offset())
                .unwrap_or_else(|| datetime.and_utc().fixed_offset());

            RemoteTime::DateTime {
                date_time,
                time_zone: timezone::remote_zone_name(tzid).to_string(),
            }
        }
        EventTime::DateTimeFeedZone {
            datetime,
            tzid,
            offset,
        } => RemoteTime::DateTime {
            date_time: offset
                .from_local_datetime(datetime)
                .single()
                .unwrap_or_else(|| datetime.and_utc().fixed_offset()),
            time_zone: timezone::remote_zone_name(tzid).to_string(),
        },
    }
}

/// RRULE line plus one EXDATE line per exception date, for recurring masters.
pub fn recurrence_block(entry: &CalendarEntry) -> Option<Vec<String>> {
    let rule = entry.recurrence_rule.as_ref()?;

    let mut lines = Vec::with_capacity(entry.exception_dates.len() + 1);
    lines.push(format!("RRULE:{}", rule));
    lines.extend(
        entry
            .exception_dates
            .iter()
            .map(|exdate| format_exdate(exdate, entry.is_all_day())),
    );

    Some(lines)
}

/// Format one excluded occurrence as an EXDATE line.
///
/// All-day series (and date-only values) use the `VALUE=DATE` form; timed
/// values are converted to UTC and written with a `Z` suffix.
pub fn format_exdate(exdate: &EventTime, series_all_day: bool) -> String {
    match exdate.to_utc() {
        Some(utc) if !series_all_day => format!("EXDATE:{}", utc.format("%Y%m%dT%H%M%SZ")),
        _ => format!("EXDATE;VALUE=DATE:{}", exdate.date().format("%Y%m%d")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn wall(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> EventTime {
        EventTime::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn moscow(dt: NaiveDateTime) -> EventTime {
        EventTime::DateTimeZoned {
            datetime: dt,
            tzid: "Europe/Moscow".to_string(),
        }
    }

    fn entry(start: EventTime, end: EventTime) -> CalendarEntry {
        CalendarEntry {
            uid: "series-1".to_string(),
            summary: "Planning".to_string(),
            description: String::new(),
            location: String::new(),
            start,
            end,
            recurrence_rule: None,
            exception_dates: Vec::new(),
            recurrence_id: None,
        }
    }

    #[test]
    fn test_weekly_all_day_series_with_date_exclusion() {
        let mut master = entry(date(2024, 6, 1), date(2024, 6, 2));
        master.recurrence_rule = Some("FREQ=WEEKLY".to_string());
        master.exception_dates = vec![date(2024, 6, 8)];

        assert_eq!(
            recurrence_block(&master),
            Some(vec![
                "RRULE:FREQ=WEEKLY".to_string(),
                "EXDATE;VALUE=DATE:20240608".to_string(),
            ])
        );
    }

    #[test]
    fn test_timed_exclusion_is_converted_to_utc() {
        let exdate = moscow(wall(2024, 6, 8, 9, 0));
        assert_eq!(format_exdate(&exdate, false), "EXDATE:20240608T060000Z");

        let windows_name = EventTime::DateTimeZoned {
            datetime: wall(2024, 6, 8, 9, 0),
            tzid: "Russian Standard Time".to_string(),
        };
        assert_eq!(format_exdate(&windows_name, false), "EXDATE:20240608T060000Z");
    }

    #[test]
    fn test_timed_exclusion_on_all_day_series_uses_date_form() {
        let exdate = moscow(wall(2024, 6, 8, 9, 0));
        assert_eq!(format_exdate(&exdate, true), "EXDATE;VALUE=DATE:20240608");
    }

    #[test]
    fn test_floating_exclusion_is_read_as_utc() {
        let exdate = EventTime::DateTimeFloating(wall(2024, 6, 8, 9, 0));
        assert_eq!(format_exdate(&exdate, false), "EXDATE:20240608T090000Z");
    }

    #[test]
    fn test_single_event_has_no_recurrence_block() {
        let single = entry(date(2024, 6, 1), date(2024, 6, 2));
        let payload = EventPayload::for_master(&single, "exchange-sync");
        assert_eq!(payload.recurrence, None);
        assert_eq!(payload.tags.uid, "series-1");
        assert_eq!(payload.tags.sync_marker, "exchange-sync");
        assert_eq!(
            payload.start,
            RemoteTime::Date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
        );
    }

    #[test]
    fn test_known_zone_keeps_name_and_offset() {
        let remote = to_remote_time(&EventTime::DateTimeZoned {
            datetime: wall(2024, 6, 8, 9, 0),
            tzid: "China Standard Time".to_string(),
        });
        match remote {
            RemoteTime::DateTime {
                date_time,
                time_zone,
            } => {
                assert_eq!(date_time.to_rfc3339(), "2024-06-08T09:00:00+08:00");
                assert_eq!(time_zone, "Asia/Shanghai");
            }
            other => panic!("Expected timed value, got {:?}", other),
        }
    }

    #[test]
    fn test_unmapped_zone_is_named_utc_but_keeps_offset() {
        let remote = to_remote_time(&EventTime::DateTimeZoned {
            datetime: wall(2024, 1, 8, 10, 0),
            tzid: "America/New_York".to_string(),
        });
        match remote {
            RemoteTime::DateTime {
                date_time,
                time_zone,
            } => {
                assert_eq!(date_time.to_rfc3339(), "2024-01-08T10:00:00-05:00");
                assert_eq!(time_zone, "UTC");
            }
            other => panic!("Expected timed value, got {:?}", other),
        }
    }

    #[test]
    fn test_feed_defined_zone_sends_its_offset() {
        let pacific = EventTime::DateTimeFeedZone {
            datetime: wall(2024, 1, 10, 10, 0),
            tzid: "Pacific Standard Time".to_string(),
            offset: chrono::FixedOffset::west_opt(8 * 3600).unwrap(),
        };

        match to_remote_time(&pacific) {
            RemoteTime::DateTime {
                date_time,
                time_zone,
            } => {
                assert_eq!(date_time.to_rfc3339(), "2024-01-10T10:00:00-08:00");
                assert_eq!(time_zone, "UTC");
            }
            other => panic!("Expected timed value, got {:?}", other),
        }
        assert_eq!(format_exdate(&pacific, false), "EXDATE:20240110T180000Z");
    }

    #[test]
    fn test_exception_patch_has_no_recurrence_fields() {
        let mut exception = entry(
            moscow(wall(2024, 6, 8, 12, 0)),
            moscow(wall(2024, 6, 8, 13, 0)),
        );
        exception.recurrence_id = Some(moscow(wall(2024, 6, 8, 9, 0)));
        exception.summary = "Moved".to_string();

        let patch = OccurrencePatch::for_exception(&exception);
        assert_eq!(patch.summary, "Moved");
        assert_eq!(patch.start, to_remote_time(&exception.start));
    }
}
