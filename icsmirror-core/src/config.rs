//! Settings the reconciler is constructed with.

/// Tag written into every event this tool creates, unless configured otherwise.
pub const DEFAULT_SYNC_MARKER: &str = "exchange-sync";

/// Immutable per-run settings for the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Remote calendar that receives the mirrored events
    pub calendar_id: String,
    /// Private tag that identifies events managed by this tool
    pub sync_marker: String,
}

impl SyncConfig {
    pub fn new(calendar_id: impl Into<String>, sync_marker: impl Into<String>) -> Self {
        SyncConfig {
            calendar_id: calendar_id.into(),
            sync_marker: sync_marker.into(),
        }
    }
}
