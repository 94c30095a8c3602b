use icsmirror_core::remote::{Occurrence, OccurrenceStart, RemoteEvent, UID_TAG};

use crate::types::{EventDateTime, GoogleEvent};

pub trait FromGoogle: Sized {
    /// `None` when the event has no id.
    fn from_google(event: GoogleEvent) -> Option<Self>;
}

impl FromGoogle for RemoteEvent {
    fn from_google(event: GoogleEvent) -> Option<Self> {
        let uid = event
            .extended_properties
            .as_ref()
            .and_then(|props| props.private.as_ref())
            .and_then(|private| private.get(UID_TAG))
            .cloned();

        Some(RemoteEvent {
            id: event.id?,
            uid,
            recurring_event_id: event.recurring_event_id,
        })
    }
}

impl FromGoogle for Occurrence {
    fn from_google(event: GoogleEvent) -> Option<Self> {
        Some(Occurrence {
            id: event.id?,
            original_start: event.original_start_time.as_ref().and_then(start_from_google),
            start: event.start.as_ref().and_then(start_from_google),
        })
    }
}

fn start_from_google(time: &EventDateTime) -> Option<OccurrenceStart> {
    if let Some(dt) = time.date_time {
        Some(OccurrenceStart::DateTime(dt))
    } else {
        time.date.map(OccurrenceStart::Date)
    }
}
