//! Calendar provider capability and its Google Calendar implementation.
//!
//! The core only ever talks to the `CalendarProvider` trait; the Google REST
//! client below is one implementation of it. OAuth is out of scope here: the
//! provider expects an already-granted bearer token in the environment.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::env;

/// Marker embedded in every entry description this tool creates; the cleanup
/// scanner keys on it later.
pub const PROVENANCE_MARKER: &str = "Added by SyllaSync";

/// Environment variable holding the granted Google Calendar access token.
pub const TOKEN_ENV_VAR: &str = "GOOGLE_CALENDAR_TOKEN";

const API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// External calendar record. For inserts `id` is left empty and assigned by
/// the provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarEntry {
    pub id: String,
    pub summary: String,
    pub description: String,
    /// All-day entries: start == end, calendar date only.
    pub start_date: String,
    pub end_date: String,
    pub color_id: Option<String>,
    /// "transparent" for non-blocking entries such as study reminders.
    pub transparency: Option<String>,
}

/// Per-id outcome of a grouped delete.
#[derive(Debug)]
pub struct DeleteOutcome {
    pub id: String,
    pub result: SyncResult<()>,
}

/// Capability the reconciler and cleanup scanner operate against.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Insert one entry, returning the id the provider assigned.
    async fn insert(&self, calendar_id: &str, entry: &CalendarEntry) -> SyncResult<String>;

    /// List the whole calendar, recurrences expanded to single instances,
    /// ordered by start time. No date-range filter: cleanup must see
    /// everything this tool ever created.
    async fn list(&self, calendar_id: &str) -> SyncResult<Vec<CalendarEntry>>;

    /// Delete a group of entries. One item failing never aborts the rest.
    async fn delete_batch(&self, calendar_id: &str, ids: &[String]) -> SyncResult<Vec<DeleteOutcome>>;
}

/// Google Calendar REST provider.
pub struct GoogleCalendarProvider {
    client: Client,
    access_token: String,
    time_zone: String,
}

impl GoogleCalendarProvider {
    pub fn new(access_token: String, time_zone: String) -> Self {
        Self { client: Client::new(), access_token, time_zone }
    }

    /// Build a provider from the token the external OAuth flow placed in the
    /// environment.
    pub fn from_env(time_zone: &str) -> SyncResult<Self> {
        let access_token = env::var(TOKEN_ENV_VAR).map_err(|_| {
            SyncError::ProviderAuth(format!(
                "{} not set; run the authorization flow and export the access token",
                TOKEN_ENV_VAR
            ))
        })?;
        Ok(Self::new(access_token, time_zone.to_string()))
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!("{}/calendars/{}/events", API_BASE, calendar_id)
    }

    fn entry_body(&self, entry: &CalendarEntry) -> Value {
        let mut body = json!({
            "summary": entry.summary,
            "description": entry.description,
            "start": { "date": entry.start_date, "timeZone": self.time_zone },
            "end": { "date": entry.end_date, "timeZone": self.time_zone },
        });
        if let Some(color_id) = &entry.color_id {
            body["colorId"] = json!(color_id);
        }
        if let Some(transparency) = &entry.transparency {
            body["transparency"] = json!(transparency);
        }
        body
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarProvider {
    async fn insert(&self, calendar_id: &str, entry: &CalendarEntry) -> SyncResult<String> {
        let response = self
            .client
            .post(self.events_url(calendar_id))
            .bearer_auth(&self.access_token)
            .json(&self.entry_body(entry))
            .send()
            .await
            .map_err(|e| SyncError::ProviderTransport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_failure(status, &body));
        }

        let created: Value = response
            .json()
            .await
            .map_err(|e| SyncError::ProviderItem(format!("Unreadable insert response: {}", e)))?;

        created
            .get("id")
            .and_then(|id| id.as_str())
            .map(|id| id.to_string())
            .ok_or_else(|| SyncError::ProviderItem("Insert response missing event id".to_string()))
    }

    async fn list(&self, calendar_id: &str) -> SyncResult<Vec<CalendarEntry>> {
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("maxResults", "2500".to_string()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self
                .client
                .get(self.events_url(calendar_id))
                .bearer_auth(&self.access_token)
                .query(&query)
                .send()
                .await
                .map_err(|e| SyncError::ProviderTransport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(classify_http_failure(status, &body));
            }

            let page: Value = response
                .json()
                .await
                .map_err(|e| SyncError::ProviderTransport(format!("Unreadable list response: {}", e)))?;

            if let Some(items) = page.get("items").and_then(|i| i.as_array()) {
                entries.extend(items.iter().map(entry_from_value));
            }

            page_token = page
                .get("nextPageToken")
                .and_then(|t| t.as_str())
                .map(|t| t.to_string());
            if page_token.is_none() {
                break;
            }
        }

        debug!("Listed {} calendar entries", entries.len());
        Ok(entries)
    }

    async fn delete_batch(&self, calendar_id: &str, ids: &[String]) -> SyncResult<Vec<DeleteOutcome>> {
        let mut outcomes = Vec::with_capacity(ids.len());

        for id in ids {
            let result = self
                .client
                .delete(format!("{}/{}", self.events_url(calendar_id), id))
                .bearer_auth(&self.access_token)
                .send()
                .await;

            let outcome = match result {
                Ok(response) if response.status().is_success() => {
                    debug!("Deleted {}", id);
                    Ok(())
                }
                // Already gone counts as deleted
                Ok(response) if response.status() == StatusCode::GONE => Ok(()),
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    error!("Delete of {} failed: {} {}", id, status, body);
                    Err(SyncError::ProviderItem(format!("HTTP {}: {}", status, body)))
                }
                Err(e) => {
                    error!("Delete of {} failed: {}", id, e);
                    Err(SyncError::ProviderItem(e.to_string()))
                }
            };
            outcomes.push(DeleteOutcome { id: id.clone(), result: outcome });
        }

        Ok(outcomes)
    }
}

fn classify_http_failure(status: StatusCode, body: &str) -> SyncError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SyncError::ProviderAuth(format!("HTTP {}: {}", status, body))
        }
        s if s.is_server_error() => SyncError::ProviderTransport(format!("HTTP {}: {}", s, body)),
        s => SyncError::ProviderItem(format!("HTTP {}: {}", s, body)),
    }
}

fn entry_from_value(event: &Value) -> CalendarEntry {
    let text = |field: &str| {
        event
            .get(field)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    };
    // All-day entries carry "date"; timed ones "dateTime".
    let edge_date = |field: &str| {
        event
            .get(field)
            .and_then(|edge| edge.get("date").or_else(|| edge.get("dateTime")))
            .and_then(|d| d.as_str())
            .unwrap_or("")
            .to_string()
    };

    CalendarEntry {
        id: text("id"),
        summary: text("summary"),
        description: text("description"),
        start_date: edge_date("start"),
        end_date: edge_date("end"),
        color_id: event.get("colorId").and_then(|c| c.as_str()).map(|c| c.to_string()),
        transparency: event.get("transparency").and_then(|t| t.as_str()).map(|t| t.to_string()),
    }
}
