//! `CalendarService` over the Calendar v3 REST API.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use icsmirror_core::remote::{
    CalendarService, EventPage, EventPayload, Occurrence, OccurrencePatch, RemoteEvent, TimeWindow,
};
use icsmirror_core::{RemoteError, RemoteResult};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::google_event::{FromGoogle, ToGoogle};
use crate::types::{EventList, GoogleEvent};

pub const CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";

/// Largest page Google allows for `events.list`.
const LIST_PAGE_SIZE: &str = "2500";

/// One Google calendar, accessed with a bearer token.
pub struct GoogleCalendar {
    http: reqwest::Client,
    base_url: String,
    calendar_id: String,
    access_token: String,
}

impl GoogleCalendar {
    pub fn new(calendar_id: &str, access_token: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(GoogleCalendar {
            http,
            base_url: CALENDAR_API.to_string(),
            calendar_id: calendar_id.to_string(),
            access_token: access_token.to_string(),
        })
    }

    /// Point the client at another API root (used against mock servers).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(&self.calendar_id)
        )
    }

    fn event_url(&self, event_id: &str) -> String {
        format!("{}/{}", self.events_url(), urlencoding::encode(event_id))
    }

    async fn send(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            return Err(RemoteError::Auth(body));
        }
        Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<T> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn write_event(&self, request: RequestBuilder) -> RemoteResult<String> {
        let event: GoogleEvent = self.send_json(request).await?;
        event
            .id
            .ok_or_else(|| RemoteError::Decode("Response has no event id".to_string()))
    }
}

impl CalendarService for GoogleCalendar {
    async fn list_tagged_events(
        &self,
        sync_marker: &str,
        page_token: Option<&str>,
    ) -> RemoteResult<EventPage> {
        let filter = format!("syncMarker={}", sync_marker);
        let mut query = vec![
            ("privateExtendedProperty", filter.as_str()),
            ("maxResults", LIST_PAGE_SIZE),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let list: EventList = self
            .send_json(self.http.get(self.events_url()).query(&query))
            .await?;

        Ok(EventPage {
            events: list
                .items
                .into_iter()
                .filter_map(RemoteEvent::from_google)
                .collect(),
            next_page_token: list.next_page_token.filter(|token| !token.is_empty()),
        })
    }

    async fn create_event(&self, payload: &EventPayload) -> RemoteResult<String> {
        self.write_event(self.http.post(self.events_url()).json(&payload.to_google()))
            .await
    }

    async fn update_event(&self, event_id: &str, payload: &EventPayload) -> RemoteResult<String> {
        self.write_event(
            self.http
                .put(self.event_url(event_id))
                .json(&payload.to_google()),
        )
        .await
    }

    async fn patch_event(&self, event_id: &str, patch: &OccurrencePatch) -> RemoteResult<()> {
        self.send(
            self.http
                .patch(self.event_url(event_id))
                .json(&patch.to_google()),
        )
        .await?;
        Ok(())
    }

    async fn delete_event(&self, event_id: &str) -> RemoteResult<()> {
        match self.send(self.http.delete(self.event_url(event_id))).await {
            Ok(_) => Ok(()),
            // Already deleted
            Err(RemoteError::Status { status: 410, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn list_occurrences(
        &self,
        series_id: &str,
        window: &TimeWindow,
        max_results: u32,
    ) -> RemoteResult<Vec<Occurrence>> {
        let time_min = window.start.to_rfc3339_opts(SecondsFormat::Secs, true);
        let time_max = window.end.to_rfc3339_opts(SecondsFormat::Secs, true);
        let max_results = max_results.to_string();
        let url = format!("{}/instances", self.event_url(series_id));

        let list: EventList = self
            .send_json(self.http.get(url).query(&[
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("maxResults", max_results.as_str()),
            ]))
            .await?;

        Ok(list
            .items
            .into_iter()
            .filter_map(Occurrence::from_google)
            .collect())
    }
}
