//! Index of the remote events this tool manages.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::remote::{CalendarService, RemoteEvent};

/// uid -> remote event, for every event tagged with the sync marker.
#[derive(Debug, Default)]
pub struct RemoteIndex {
    events: HashMap<String, RemoteEvent>,
}

impl RemoteIndex {
    /// Page through every tagged event.
    ///
    /// Events without a uid tag and expanded instances of a series are
    /// skipped. Any listing failure aborts the run.
    pub async fn build<S: CalendarService>(service: &S, sync_marker: &str) -> CoreResult<Self> {
        let mut events = HashMap::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = service
                .list_tagged_events(sync_marker, page_token.as_deref())
                .await
                .map_err(CoreError::IndexBuild)?;

            for event in page.events {
                if event.recurring_event_id.is_some() {
                    continue;
                }
                if let Some(uid) = event.uid.clone() {
                    events.insert(uid, event);
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(count = events.len(), "Indexed synced remote events");
        Ok(RemoteIndex { events })
    }

    pub fn get(&self, uid: &str) -> Option<&RemoteEvent> {
        self.events.get(uid)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RemoteEvent)> {
        self.events.iter()
    }
}
