//! In-memory `CalendarService` for pipeline tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::error::{RemoteError, RemoteResult};
use crate::remote::{
    CalendarService, EventPage, EventPayload, Occurrence, OccurrencePatch, RemoteEvent, TimeWindow,
};

const DEFAULT_MARKER: &str = "exchange-sync";

struct StoredEvent {
    event: RemoteEvent,
    marker: String,
}

#[derive(Default)]
struct State {
    events: Vec<StoredEvent>,
    page_size: usize,
    list_calls: usize,
    list_failure: Option<RemoteError>,
    occurrence_failure: Option<RemoteError>,
    occurrences: HashMap<String, Vec<Occurrence>>,
    occurrence_requests: Vec<(String, TimeWindow, u32)>,
    created: Vec<String>,
    updated: Vec<String>,
    deleted: Vec<String>,
    patches: Vec<(String, OccurrencePatch)>,
    fail_create: HashSet<String>,
    fail_delete: HashSet<String>,
}

/// Remote ids are `remote-<uid>`, so tests can predict them.
pub struct MemoryCalendar {
    state: RefCell<State>,
}

impl MemoryCalendar {
    pub fn new() -> Self {
        Self::with_page_size(100)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        MemoryCalendar {
            state: RefCell::new(State {
                page_size,
                ..State::default()
            }),
        }
    }

    pub fn seed_event(&self, uid: &str, marker: &str) {
        self.state.borrow_mut().events.push(StoredEvent {
            event: RemoteEvent {
                id: format!("remote-{}", uid),
                uid: Some(uid.to_string()),
                recurring_event_id: None,
            },
            marker: marker.to_string(),
        });
    }

    pub fn seed_raw(&self, event: RemoteEvent) {
        self.state.borrow_mut().events.push(StoredEvent {
            event,
            marker: DEFAULT_MARKER.to_string(),
        });
    }

    pub fn set_occurrences(&self, series_id: &str, occurrences: Vec<Occurrence>) {
        self.state
            .borrow_mut()
            .occurrences
            .insert(series_id.to_string(), occurrences);
    }

    pub fn fail_listing(&self, error: RemoteError) {
        self.state.borrow_mut().list_failure = Some(error);
    }

    pub fn fail_occurrences(&self, error: RemoteError) {
        self.state.borrow_mut().occurrence_failure = Some(error);
    }

    pub fn fail_create_for(&self, uid: &str) {
        self.state.borrow_mut().fail_create.insert(uid.to_string());
    }

    pub fn fail_delete_for(&self, event_id: &str) {
        self.state.borrow_mut().fail_delete.insert(event_id.to_string());
    }

    pub fn list_calls(&self) -> usize {
        self.state.borrow().list_calls
    }

    pub fn created_uids(&self) -> Vec<String> {
        self.state.borrow().created.clone()
    }

    pub fn updated_ids(&self) -> Vec<String> {
        self.state.borrow().updated.clone()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.state.borrow().deleted.clone()
    }

    pub fn patches(&self) -> Vec<(String, OccurrencePatch)> {
        self.state.borrow().patches.clone()
    }

    pub fn occurrence_requests(&self) -> Vec<(String, TimeWindow, u32)> {
        self.state.borrow().occurrence_requests.clone()
    }
}

fn server_error() -> RemoteError {
    RemoteError::Status {
        status: 500,
        body: "Backend Error".to_string(),
    }
}

impl CalendarService for MemoryCalendar {
    async fn list_tagged_events(
        &self,
        sync_marker: &str,
        page_token: Option<&str>,
    ) -> RemoteResult<EventPage> {
        let mut state = self.state.borrow_mut();
        state.list_calls += 1;
        if let Some(error) = state.list_failure.clone() {
            return Err(error);
        }

        let offset: usize = page_token.and_then(|t| t.parse().ok()).unwrap_or(0);
        let tagged: Vec<RemoteEvent> = state
            .events
            .iter()
            .filter(|stored| stored.marker == sync_marker)
            .map(|stored| stored.event.clone())
            .collect();

        let end = (offset + state.page_size).min(tagged.len());
        let next_page_token = (end < tagged.len()).then(|| end.to_string());

        Ok(EventPage {
            events: tagged[offset.min(end)..end].to_vec(),
            next_page_token,
        })
    }

    async fn create_event(&self, payload: &EventPayload) -> RemoteResult<String> {
        let mut state = self.state.borrow_mut();
        let uid = payload.tags.uid.clone();
        if state.fail_create.contains(&uid) {
            return Err(server_error());
        }

        let id = format!("remote-{}", uid);
        state.events.push(StoredEvent {
            event: RemoteEvent {
                id: id.clone(),
                uid: Some(uid.clone()),
                recurring_event_id: None,
            },
            marker: payload.tags.sync_marker.clone(),
        });
        state.created.push(uid);
        Ok(id)
    }

    async fn update_event(&self, event_id: &str, _payload: &EventPayload) -> RemoteResult<String> {
        let mut state = self.state.borrow_mut();
        if !state.events.iter().any(|stored| stored.event.id == event_id) {
            return Err(RemoteError::Status {
                status: 404,
                body: "Not Found".to_string(),
            });
        }
        state.updated.push(event_id.to_string());
        Ok(event_id.to_string())
    }

    async fn patch_event(&self, event_id: &str, patch: &OccurrencePatch) -> RemoteResult<()> {
        self.state
            .borrow_mut()
            .patches
            .push((event_id.to_string(), patch.clone()));
        Ok(())
    }

    async fn delete_event(&self, event_id: &str) -> RemoteResult<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_delete.contains(event_id) {
            return Err(server_error());
        }
        state.events.retain(|stored| stored.event.id != event_id);
        state.deleted.push(event_id.to_string());
        Ok(())
    }

    async fn list_occurrences(
        &self,
        series_id: &str,
        window: &TimeWindow,
        max_results: u32,
    ) -> RemoteResult<Vec<Occurrence>> {
        let mut state = self.state.borrow_mut();
        if let Some(error) = state.occurrence_failure.clone() {
            return Err(error);
        }
        state
            .occurrence_requests
            .push((series_id.to_string(), *window, max_results));
        Ok(state
            .occurrences
            .get(series_id)
            .cloned()
            .unwrap_or_default())
    }
}
