//! First pass: create or update every master entry.

use std::collections::HashMap;

use crate::event::CalendarEntry;
use crate::remote::{CalendarService, EventPayload};
use crate::sync::{RemoteIndex, SyncReport};

/// uid -> remote id of the series or single event that uid maps to.
///
/// Filled from this run's writes first, then topped up from the index so
/// exceptions can still find series that were not rewritten.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RemoteIdMap {
    ids: HashMap<String, String>,
}

impl RemoteIdMap {
    pub fn insert(&mut self, uid: impl Into<String>, remote_id: impl Into<String>) {
        self.ids.insert(uid.into(), remote_id.into());
    }

    pub fn get(&self, uid: &str) -> Option<&str> {
        self.ids.get(uid).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Add index entries for uids not written in this run.
    pub fn merge_index(&mut self, index: &RemoteIndex) {
        for (uid, event) in index.iter() {
            self.ids
                .entry(uid.clone())
                .or_insert_with(|| event.id.clone());
        }
    }
}

/// Create-or-update every master, one attempt each.
///
/// Failures are logged and counted; the returned map already includes the
/// index entries.
pub async fn reconcile_masters<S: CalendarService>(
    service: &S,
    masters: &HashMap<String, CalendarEntry>,
    index: &RemoteIndex,
    sync_marker: &str,
    report: &mut SyncReport,
) -> RemoteIdMap {
    let mut ids = RemoteIdMap::default();

    for (uid, entry) in masters {
        let payload = EventPayload::for_master(entry, sync_marker);

        match index.get(uid) {
            Some(existing) => match service.update_event(&existing.id, &payload).await {
                Ok(remote_id) => {
                    ids.insert(uid.as_str(), remote_id);
                    report.updated += 1;
                }
                Err(e) => {
                    tracing::error!(summary = %entry.summary, uid = %uid, error = %e, "Failed to update event");
                    report.errors += 1;
                }
            },
            None => match service.create_event(&payload).await {
                Ok(remote_id) => {
                    ids.insert(uid.as_str(), remote_id);
                    report.created += 1;
                }
                Err(e) => {
                    tracing::error!(summary = %entry.summary, uid = %uid, error = %e, "Failed to create event");
                    report.errors += 1;
                }
            },
        }
    }

    ids.merge_index(index);
    ids
}
