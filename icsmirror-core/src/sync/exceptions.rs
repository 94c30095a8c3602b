//! Second pass: apply exception occurrences to their remote instances.

use crate::event::CalendarEntry;
use crate::remote::{CalendarService, OccurrencePatch};
use crate::sync::occurrence::resolve_occurrence;
use crate::sync::{RemoteIdMap, SyncReport};

pub async fn reconcile_exceptions<S: CalendarService>(
    service: &S,
    exceptions: &[CalendarEntry],
    ids: &RemoteIdMap,
    report: &mut SyncReport,
) {
    for exception in exceptions {
        let Some(original_start) = exception.recurrence_id.as_ref() else {
            continue;
        };

        let Some(series_id) = ids.get(&exception.uid) else {
            tracing::warn!(
                summary = %exception.summary,
                uid = %exception.uid,
                "No parent found for exception"
            );
            report.exception_errors += 1;
            continue;
        };

        let Some(occurrence_id) = resolve_occurrence(service, series_id, original_start).await
        else {
            tracing::warn!(
                summary = %exception.summary,
                recurrence_id = %original_start,
                "Could not find instance for exception"
            );
            report.exception_errors += 1;
            continue;
        };

        let patch = OccurrencePatch::for_exception(exception);
        match service.patch_event(&occurrence_id, &patch).await {
            Ok(()) => report.exceptions_updated += 1,
            Err(e) => {
                tracing::error!(summary = %exception.summary, error = %e, "Failed to update exception");
                report.exception_errors += 1;
            }
        }
    }
}
