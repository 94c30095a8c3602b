//! Locating one occurrence of a remote series by its original start.

use chrono::{DateTime, Days, Duration, NaiveTime, Utc};

use crate::event::EventTime;
use crate::remote::{CalendarService, Occurrence, OccurrenceStart, TimeWindow};

/// Timed instances match when strictly closer than this to the target.
pub const MATCH_TOLERANCE_SECS: i64 = 120;

/// Instances requested per lookup.
pub const MAX_OCCURRENCES: u32 = 10;

/// Where to look for an occurrence scheduled at `original_start`.
///
/// All-day targets cover their UTC day; timed targets get one day either side.
pub fn search_window(original_start: &EventTime) -> TimeWindow {
    match original_start.to_utc() {
        Some(target) => TimeWindow {
            start: target - Duration::days(1),
            end: target + Duration::days(1),
        },
        None => {
            let date = original_start.date();
            let start = date.and_time(NaiveTime::MIN).and_utc();
            let end = date
                .checked_add_days(Days::new(1))
                .map(|next| next.and_time(NaiveTime::MIN).and_utc())
                .unwrap_or(start);
            TimeWindow { start, end }
        }
    }
}

/// Whether `occurrence` is the one scheduled at `original_start`.
pub fn occurrence_matches(occurrence: &Occurrence, original_start: &EventTime) -> bool {
    match (original_start.to_utc(), occurrence.scheduled_start()) {
        (None, Some(OccurrenceStart::Date(date))) => *date == original_start.date(),
        (Some(target), Some(OccurrenceStart::DateTime(start))) => {
            within_tolerance(start.with_timezone(&Utc), target)
        }
        _ => false,
    }
}

fn within_tolerance(instance: DateTime<Utc>, target: DateTime<Utc>) -> bool {
    (instance - target).abs() < Duration::seconds(MATCH_TOLERANCE_SECS)
}

/// Remote id of the occurrence of `series_id` originally at `original_start`.
///
/// Lookup failures are logged and reported as not found.
pub async fn resolve_occurrence<S: CalendarService>(
    service: &S,
    series_id: &str,
    original_start: &EventTime,
) -> Option<String> {
    let window = search_window(original_start);

    let occurrences = match service
        .list_occurrences(series_id, &window, MAX_OCCURRENCES)
        .await
    {
        Ok(occurrences) => occurrences,
        Err(e) => {
            tracing::warn!(series_id, error = %e, "Error finding instance");
            return None;
        }
    };

    occurrences
        .into_iter()
        .find(|occurrence| occurrence_matches(occurrence, original_start))
        .map(|occurrence| occurrence.id)
}
