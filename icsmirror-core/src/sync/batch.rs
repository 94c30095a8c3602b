//! Splitting a normalized feed into masters and exception occurrences.

use std::collections::{HashMap, HashSet};

use crate::event::CalendarEntry;

/// One run's worth of feed entries, classified.
#[derive(Debug, Default)]
pub struct FeedBatch {
    /// Non-exception entries keyed by uid; a later duplicate replaces an earlier one
    pub masters: HashMap<String, CalendarEntry>,
    /// Exception occurrences in feed order
    pub exceptions: Vec<CalendarEntry>,
    /// Every uid seen in the feed, masters and exceptions alike
    pub current_uids: HashSet<String>,
}

impl FeedBatch {
    pub fn from_entries(entries: Vec<CalendarEntry>) -> Self {
        let mut batch = FeedBatch::default();

        for entry in entries {
            batch.current_uids.insert(entry.uid.clone());
            if entry.is_exception() {
                batch.exceptions.push(entry);
            } else {
                batch.masters.insert(entry.uid.clone(), entry);
            }
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventTime;
    use chrono::NaiveDate;

    fn entry(uid: &str, summary: &str, recurrence_id: Option<EventTime>) -> CalendarEntry {
        let day = EventTime::Date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        CalendarEntry {
            uid: uid.to_string(),
            summary: summary.to_string(),
            description: String::new(),
            location: String::new(),
            start: day.clone(),
            end: day,
            recurrence_rule: None,
            exception_dates: Vec::new(),
            recurrence_id,
        }
    }

    #[test]
    fn test_duplicate_master_uid_last_wins() {
        let batch = FeedBatch::from_entries(vec![
            entry("a", "first", None),
            entry("a", "second", None),
        ]);
        assert_eq!(batch.masters.len(), 1);
        assert_eq!(batch.masters["a"].summary, "second");
    }

    #[test]
    fn test_exception_uids_count_as_current() {
        let rid = EventTime::Date(NaiveDate::from_ymd_opt(2024, 6, 8).unwrap());
        let batch = FeedBatch::from_entries(vec![
            entry("series", "master", None),
            entry("orphan", "moved", Some(rid)),
        ]);
        assert_eq!(batch.masters.len(), 1);
        assert_eq!(batch.exceptions.len(), 1);
        assert!(batch.current_uids.contains("orphan"));
        assert!(batch.current_uids.contains("series"));
    }
}
