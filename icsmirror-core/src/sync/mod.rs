//! The reconciliation pipeline.
//!
//! One run goes: classify the feed, index the remote calendar, write masters,
//! patch exception occurrences, then delete what left the feed. Stages hand
//! each other `FeedBatch`, `RemoteIndex` and `RemoteIdMap`; counts accumulate
//! in a `SyncReport`.

mod batch;
mod exceptions;
mod index;
mod masters;
mod occurrence;
mod sweep;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::FeedBatch;
pub use exceptions::reconcile_exceptions;
pub use index::RemoteIndex;
pub use masters::{RemoteIdMap, reconcile_masters};
pub use occurrence::{
    MATCH_TOLERANCE_SECS, MAX_OCCURRENCES, occurrence_matches, resolve_occurrence, search_window,
};
pub use sweep::sweep_stale;

use crate::config::SyncConfig;
use crate::error::CoreResult;
use crate::event::CalendarEntry;
use crate::remote::CalendarService;

/// Counts from one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Failed master creates and updates
    pub errors: usize,
    pub exceptions_updated: usize,
    /// Orphaned exceptions, unresolved occurrences and failed patches
    pub exception_errors: usize,
    pub delete_errors: usize,
}

impl SyncReport {
    pub fn total_errors(&self) -> usize {
        self.errors + self.exception_errors + self.delete_errors
    }
}

/// Drives a run against one remote calendar.
pub struct Reconciler<'a, S> {
    service: &'a S,
    config: &'a SyncConfig,
}

impl<'a, S: CalendarService> Reconciler<'a, S> {
    pub fn new(service: &'a S, config: &'a SyncConfig) -> Self {
        Reconciler { service, config }
    }

    /// Mirror `entries` into the remote calendar.
    ///
    /// Only a failure to list the managed events aborts; every other failure
    /// is counted in the report.
    pub async fn run(&self, entries: Vec<CalendarEntry>) -> CoreResult<SyncReport> {
        let batch = FeedBatch::from_entries(entries);
        tracing::info!(
            masters = batch.masters.len(),
            exceptions = batch.exceptions.len(),
            "Classified feed entries"
        );

        let index = RemoteIndex::build(self.service, &self.config.sync_marker).await?;
        tracing::info!(
            calendar = %self.config.calendar_id,
            existing = index.len(),
            "Found synced events"
        );

        let mut report = SyncReport::default();

        let ids = reconcile_masters(
            self.service,
            &batch.masters,
            &index,
            &self.config.sync_marker,
            &mut report,
        )
        .await;

        reconcile_exceptions(self.service, &batch.exceptions, &ids, &mut report).await;
        sweep_stale(self.service, &index, &batch.current_uids, &mut report).await;

        Ok(report)
    }
}
