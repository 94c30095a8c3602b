use std::collections::BTreeMap;

use icsmirror_core::remote::{EventPayload, OccurrencePatch, RemoteTime, SYNC_MARKER_TAG, UID_TAG};

use crate::types::{EventDateTime, ExtendedProperties, GoogleEvent};

pub trait ToGoogle {
    fn to_google(&self) -> GoogleEvent;
}

impl ToGoogle for EventPayload {
    fn to_google(&self) -> GoogleEvent {
        let private = BTreeMap::from([
            (UID_TAG.to_string(), self.tags.uid.clone()),
            (SYNC_MARKER_TAG.to_string(), self.tags.sync_marker.clone()),
        ]);

        GoogleEvent {
            summary: Some(self.summary.clone()),
            description: Some(self.description.clone()),
            location: Some(self.location.clone()),
            start: Some(time_to_google(&self.start)),
            end: Some(time_to_google(&self.end)),
            recurrence: self.recurrence.clone(),
            extended_properties: Some(ExtendedProperties {
                private: Some(private),
            }),
            ..Default::default()
        }
    }
}

impl ToGoogle for OccurrencePatch {
    fn to_google(&self) -> GoogleEvent {
        GoogleEvent {
            summary: Some(self.summary.clone()),
            description: Some(self.description.clone()),
            location: Some(self.location.clone()),
            start: Some(time_to_google(&self.start)),
            end: Some(time_to_google(&self.end)),
            ..Default::default()
        }
    }
}

fn time_to_google(time: &RemoteTime) -> EventDateTime {
    match time {
        RemoteTime::Date(date) => EventDateTime {
            date: Some(*date),
            ..Default::default()
        },
        RemoteTime::DateTime {
            date_time,
            time_zone,
        } => EventDateTime {
            date_time: Some(*date_time),
            time_zone: Some(time_zone.clone()),
            ..Default::default()
        },
    }
}
