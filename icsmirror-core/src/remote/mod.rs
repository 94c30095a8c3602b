//! Remote calendar model and the service seam.
//!
//! The reconciler only talks to a remote calendar through `CalendarService`.
//! `icsmirror-google` implements it for Google Calendar; tests use an
//! in-memory calendar.

mod payload;

pub use payload::{format_exdate, recurrence_block, to_remote_time};

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::error::RemoteResult;

/// Private property key holding the feed UID.
pub const UID_TAG: &str = "uid";
/// Private property key holding the sync marker.
pub const SYNC_MARKER_TAG: &str = "syncMarker";

/// An event as listed by the remote service.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEvent {
    pub id: String,
    /// Feed UID recovered from the private tag slot
    pub uid: Option<String>,
    /// Set when this is an expanded instance of a recurring series
    pub recurring_event_id: Option<String>,
}

/// One page of `list_tagged_events`.
#[derive(Debug, Clone, Default)]
pub struct EventPage {
    pub events: Vec<RemoteEvent>,
    pub next_page_token: Option<String>,
}

/// Start/end as the remote service wants it.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteTime {
    /// All-day, date only
    Date(NaiveDate),
    /// Timed, with the IANA zone name used for recurrence expansion
    DateTime {
        date_time: DateTime<FixedOffset>,
        time_zone: String,
    },
}

/// Private tags stored on every event this tool writes.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncTags {
    pub uid: String,
    pub sync_marker: String,
}

/// Full body for creating or replacing a master event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPayload {
    pub summary: String,
    pub description: String,
    pub location: String,
    pub start: RemoteTime,
    pub end: RemoteTime,
    /// RRULE and EXDATE lines; `None` for single events
    pub recurrence: Option<Vec<String>>,
    pub tags: SyncTags,
}

/// Partial update applied to a single occurrence of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct OccurrencePatch {
    pub summary: String,
    pub description: String,
    pub location: String,
    pub start: RemoteTime,
    pub end: RemoteTime,
}

/// Scheduled start of an occurrence as reported by the remote service.
#[derive(Debug, Clone, PartialEq)]
pub enum OccurrenceStart {
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
}

/// One expanded occurrence of a recurring series.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub id: String,
    /// Where the occurrence was scheduled before any override
    pub original_start: Option<OccurrenceStart>,
    /// Where it is scheduled now
    pub start: Option<OccurrenceStart>,
}

impl Occurrence {
    /// The start to match against: the original one when the remote reports it.
    pub fn scheduled_start(&self) -> Option<&OccurrenceStart> {
        self.original_start.as_ref().or(self.start.as_ref())
    }
}

/// Half-open search window for occurrence expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Operations the reconciler needs from a remote calendar.
///
/// Every call targets the one calendar the implementation was built for.
#[allow(async_fn_in_trait)]
pub trait CalendarService {
    /// One page of events carrying `syncMarker=<sync_marker>` in their private tags.
    async fn list_tagged_events(
        &self,
        sync_marker: &str,
        page_token: Option<&str>,
    ) -> RemoteResult<EventPage>;

    /// Create an event, returning its remote id.
    async fn create_event(&self, payload: &EventPayload) -> RemoteResult<String>;

    /// Replace an event, returning its remote id.
    async fn update_event(&self, event_id: &str, payload: &EventPayload) -> RemoteResult<String>;

    async fn patch_event(&self, event_id: &str, patch: &OccurrencePatch) -> RemoteResult<()>;

    async fn delete_event(&self, event_id: &str) -> RemoteResult<()>;

    /// Expanded occurrences of a series inside `window`.
    async fn list_occurrences(
        &self,
        series_id: &str,
        window: &TimeWindow,
        max_results: u32,
    ) -> RemoteResult<Vec<Occurrence>>;
}
