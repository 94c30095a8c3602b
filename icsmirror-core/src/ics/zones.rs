//! Time zones defined inline by the feed's VTIMEZONE components.
//!
//! Exchange exports zones under Windows names ("Pacific Standard Time") that
//! neither the known-zone table nor chrono-tz resolve. Their definitions come
//! with the feed, as STANDARD/DAYLIGHT observances with yearly transition
//! rules, so the offset in effect at a wall-clock time can be read from them.

use std::collections::HashMap;

use chrono::{Datelike, Duration, FixedOffset, NaiveDateTime, Utc};
use icalendar::parser::Component;
use rrule::RRuleSet;

/// Upper bound on transitions expanded for a single lookup.
const MAX_ONSETS: u16 = 1000;

/// VTIMEZONE definitions of one feed, keyed by TZID.
#[derive(Debug, Clone, Default)]
pub struct FeedZones {
    zones: HashMap<String, Vec<Observance>>,
}

/// One STANDARD or DAYLIGHT block.
#[derive(Debug, Clone)]
struct Observance {
    /// First onset, local time before the transition
    start: NaiveDateTime,
    offset_from: FixedOffset,
    offset_to: FixedOffset,
    /// RRULE value for repeating transitions
    rule: Option<String>,
}

impl FeedZones {
    /// Collect every VTIMEZONE among the calendar's top-level components.
    pub fn from_components(components: &[Component<'_>]) -> Self {
        let mut zones = HashMap::new();

        for vtimezone in components.iter().filter(|c| c.name == "VTIMEZONE") {
            let Some(tzid) = vtimezone.find_prop("TZID") else {
                continue;
            };

            let observances: Vec<Observance> = vtimezone
                .components
                .iter()
                .filter(|c| c.name == "STANDARD" || c.name == "DAYLIGHT")
                .filter_map(Observance::from_component)
                .collect();

            if observances.is_empty() {
                tracing::warn!(
                    tzid = %tzid.val.as_ref(),
                    "Ignoring VTIMEZONE without usable observances"
                );
                continue;
            }

            zones.insert(clean_tzid(tzid.val.as_ref()).to_string(), observances);
        }

        FeedZones { zones }
    }

    /// Number of zones the feed defines.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// UTC offset in effect at a wall-clock time in a feed-defined zone.
    ///
    /// The observance with the latest onset at or before `local` wins. Times
    /// before every onset take the earliest observance's TZOFFSETFROM.
    pub fn offset_at(&self, tzid: &str, local: &NaiveDateTime) -> Option<FixedOffset> {
        let observances = self.zones.get(clean_tzid(tzid))?;

        observances
            .iter()
            .filter_map(|o| o.last_onset(local).map(|onset| (onset, o.offset_to)))
            .max_by_key(|(onset, _)| *onset)
            .map(|(_, offset)| offset)
            .or_else(|| {
                observances
                    .iter()
                    .min_by_key(|o| o.start)
                    .map(|o| o.offset_from)
            })
    }
}

impl Observance {
    fn from_component(component: &Component<'_>) -> Option<Self> {
        let start = component
            .find_prop("DTSTART")
            .and_then(|p| parse_local(p.val.as_ref()))?;
        let offset_to = component
            .find_prop("TZOFFSETTO")
            .and_then(|p| parse_utc_offset(p.val.as_ref()))?;
        let offset_from = component
            .find_prop("TZOFFSETFROM")
            .and_then(|p| parse_utc_offset(p.val.as_ref()))
            .unwrap_or(offset_to);
        let rule = component.find_prop("RRULE").map(|p| p.val.to_string());

        Some(Observance {
            start,
            offset_from,
            offset_to,
            rule,
        })
    }

    /// Latest onset of this observance not after `local`.
    fn last_onset(&self, local: &NaiveDateTime) -> Option<NaiveDateTime> {
        if *local < self.start {
            return None;
        }

        let Some(rule) = &self.rule else {
            return Some(self.start);
        };

        // Exchange writes DTSTART as 1601; expand from the year before instead.
        // COUNT is relative to the real DTSTART, so those rules are not shifted.
        let recent = if rule.contains("COUNT=") {
            self.start
        } else {
            self.start
                .with_year(local.year() - 1)
                .filter(|shifted| *shifted > self.start)
                .unwrap_or(self.start)
        };

        latest_rule_onset(recent, rule, local)
            .or_else(|| latest_rule_onset(self.start, rule, local))
            .or(Some(self.start))
    }
}

/// Last occurrence of `rule` from `start` up to and including `local`.
fn latest_rule_onset(
    start: NaiveDateTime,
    rule: &str,
    local: &NaiveDateTime,
) -> Option<NaiveDateTime> {
    // Wall-clock values are expanded as if they were UTC
    let rrule_str = format!("DTSTART:{}Z\nRRULE:{}", start.format("%Y%m%dT%H%M%S"), rule);

    let rrule_set: RRuleSet = match rrule_str.parse() {
        Ok(set) => set,
        Err(e) => {
            tracing::debug!(rule, error = %e, "Unusable VTIMEZONE transition rule");
            return None;
        }
    };

    // `before` is exclusive
    let tz: rrule::Tz = Utc.into();
    let before = (local.and_utc() + Duration::seconds(1)).with_timezone(&tz);

    rrule_set
        .before(before)
        .all(MAX_ONSETS)
        .dates
        .last()
        .map(|dt| dt.naive_utc())
}

fn clean_tzid(tzid: &str) -> &str {
    tzid.trim().trim_matches('"')
}

fn parse_local(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    let value = value.strip_suffix('Z').unwrap_or(value);
    NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()
}

/// Parse a UTC-OFFSET value (`-0800`, `+0530`, `+053000`).
fn parse_utc_offset(value: &str) -> Option<FixedOffset> {
    let (sign, digits) = match value.trim().split_at_checked(1)? {
        ("+", digits) => (1, digits),
        ("-", digits) => (-1, digits),
        _ => return None,
    };

    if !matches!(digits.len(), 4 | 6) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hours: i32 = digits[0..2].parse().ok()?;
    let minutes: i32 = digits[2..4].parse().ok()?;
    let seconds: i32 = match digits.get(4..6) {
        Some(s) => s.parse().ok()?,
        None => 0,
    };

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60 + seconds))
}
