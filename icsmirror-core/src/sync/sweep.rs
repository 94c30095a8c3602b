//! Removal of managed events whose uid left the feed.

use std::collections::HashSet;

use crate::remote::CalendarService;
use crate::sync::{RemoteIndex, SyncReport};

pub async fn sweep_stale<S: CalendarService>(
    service: &S,
    index: &RemoteIndex,
    current_uids: &HashSet<String>,
    report: &mut SyncReport,
) {
    for (uid, event) in index.iter() {
        if current_uids.contains(uid) {
            continue;
        }

        match service.delete_event(&event.id).await {
            Ok(()) => report.deleted += 1,
            Err(e) => {
                tracing::error!(uid = %uid, event_id = %event.id, error = %e, "Failed to delete event");
                report.delete_errors += 1;
            }
        }
    }
}
