//! ICS feed parsing.
//!
//! The feed is read with the icalendar crate's parser and every VEVENT is
//! normalized into a `CalendarEntry`. VTIMEZONE components are read into a
//! per-feed zone table first.

mod parse;
mod zones;

pub use parse::{normalize, parse_feed};
pub use zones::FeedZones;
