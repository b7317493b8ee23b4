//! API client for the remote events service.
//!
//! Error handling differs by operation class and callers rely on it:
//! - listing swallows every failure and leaves the cache empty
//! - fetching one event swallows every failure and yields `None`
//! - writes log the failure and hand it back to the caller

use anyhow::{Context, Result};
use reqwest::{header, Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::cache::EventStore;
use crate::config::{events_base, Config};
use crate::models::{Event, EventDraft, ParticipantRequest, ResourceId};

use super::ApiError;

const USER_AGENT: &str = concat!("rollcall/", env!("CARGO_PKG_VERSION"));

/// API client for the events service.
/// Clone is cheap and clones share both the connection pool and the event cache.
#[derive(Clone)]
pub struct EventClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    events: EventStore,
}

impl EventClient {
    /// Create a client for the service at `origin` (e.g. `https://host`).
    pub fn new(origin: &str) -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client,
            base_url: events_base(origin),
            token: None,
            events: EventStore::new(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.base_url()?)
    }

    /// Set the bearer token for subsequent requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Copy of this client that sends `token`, sharing the pool and cache.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
            events: self.events.clone(),
        }
    }

    /// URL of the events collection
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The cached event list. Only `fetch_events` writes to it.
    pub fn events(&self) -> &EventStore {
        &self.events
    }

    fn event_url(&self, event_id: &ResourceId) -> String {
        format!("{}/{}", self.base_url, event_id)
    }

    fn participants_url(&self, event_id: &ResourceId) -> String {
        format!("{}/participants", self.event_url(event_id))
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Parse the whole body as JSON. A body of the wrong shape is an
    /// `ApiError::InvalidResponse`.
    async fn read_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
        let text = response
            .text()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to read response body from {}", url))?;

        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    /// Read a write response. The body is only read when the response
    /// declares a positive length, and a body that is not JSON reads as
    /// empty: the status already says the write went through.
    async fn read_write_echo(response: Response, url: &str) -> Result<Option<Value>> {
        let Some(length) = declared_content_length(response.headers()) else {
            debug!(url, "Response declares no content");
            return Ok(None);
        };

        debug!(url, length, "Reading response body");
        let text = response
            .text()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to read response body from {}", url))?;

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Null) => Ok(None),
            Ok(body) => Ok(Some(body)),
            Err(e) => {
                warn!(url, error = %e, "Ignoring non-JSON body of successful write");
                Ok(None)
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;
        Self::read_json(response, url).await
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: &B,
    ) -> Result<Response> {
        let response = self
            .client
            .request(method.clone(), url)
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;

        Self::check_response(response).await
    }

    async fn write_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: &B,
    ) -> Result<Option<Value>> {
        let response = self.send_json(method, url, body).await?;
        Self::read_write_echo(response, url).await
    }

    // ===== Events =====

    /// Create an event and return it as echoed by the service.
    pub async fn create_event(&self, event: &EventDraft) -> Result<Event> {
        let url = self.base_url.clone();
        debug!(name = %event.name, "Creating event");

        let result: Result<Event> = match self.send_json(Method::POST, &url, event).await {
            Ok(response) => Self::read_json(response, &url).await,
            Err(e) => Err(e),
        };
        result.inspect_err(|e| error!("Error creating event: {:#}", e))
    }

    /// Refresh the cached event list.
    ///
    /// On success the cache holds exactly the returned list, in order. On
    /// any failure it is emptied; the error is logged and not returned.
    pub async fn fetch_events(&self) {
        debug!(url = %self.base_url, "Fetching events");

        match self.get_json::<Value>(&self.base_url).await.and_then(parse_event_list) {
            Ok(events) => {
                debug!(count = events.len(), "Fetched events");
                self.events.replace(events);
            }
            Err(e) => {
                warn!("Error fetching events: {:#}", e);
                self.events.clear();
            }
        }
    }

    /// Fetch a single event. Any failure, including "not found", yields `None`.
    pub async fn get_event_by_id(&self, event_id: impl Into<ResourceId>) -> Option<Event> {
        let event_id = event_id.into();
        let url = self.event_url(&event_id);

        match self.get_json::<Event>(&url).await {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(event_id = %event_id, "Error fetching event: {:#}", e);
                None
            }
        }
    }

    // ===== Participants =====

    /// Register `participant_name` for an event, unconfirmed.
    ///
    /// Returns whatever JSON the service echoes back, usually the stored
    /// participant.
    pub async fn register_for_event(
        &self,
        event_id: impl Into<ResourceId>,
        participant_name: &str,
    ) -> Result<Option<Value>> {
        let event_id = event_id.into();
        let url = self.participants_url(&event_id);
        let participant = ParticipantRequest::registration(participant_name);
        debug!(event_id = %event_id, participant = participant_name, "Registering for event");

        self.write_json(Method::POST, &url, &participant)
            .await
            .inspect_err(|e| error!(event_id = %event_id, "Error registering for event: {:#}", e))
    }

    /// Set the confirmed flag of a participant.
    pub async fn confirm_participation(
        &self,
        event_id: impl Into<ResourceId>,
        participant_id: impl Into<ResourceId>,
        confirmed: bool,
    ) -> Result<Option<Value>> {
        let event_id = event_id.into();
        let participant_id = participant_id.into();
        let url = format!("{}/confirm", self.participants_url(&event_id));
        let participant = ParticipantRequest::confirmation(&participant_id, confirmed);
        debug!(
            event_id = %event_id,
            participant_id = %participant_id,
            confirmed,
            "Confirming participation"
        );

        self.write_json(Method::POST, &url, &participant)
            .await
            .inspect_err(|e| {
                error!(
                    event_id = %event_id,
                    participant_id = %participant_id,
                    "Error confirming participation: {:#}",
                    e
                )
            })
    }

    /// Remove a participant from an event. The body is the bare id.
    pub async fn remove_participant(
        &self,
        event_id: impl Into<ResourceId>,
        participant_id: impl Into<ResourceId>,
    ) -> Result<Option<Value>> {
        let event_id = event_id.into();
        let participant_id = participant_id.into();
        let url = self.participants_url(&event_id);
        debug!(event_id = %event_id, participant_id = %participant_id, "Removing participant");

        self.write_json(Method::DELETE, &url, &participant_id)
            .await
            .inspect_err(|e| {
                error!(
                    event_id = %event_id,
                    participant_id = %participant_id,
                    "Error removing participant: {:#}",
                    e
                )
            })
    }
}

/// Length declared by the `Content-Length` header, if positive.
///
/// A missing, unparseable, zero or negative value means "no content".
pub fn declared_content_length(headers: &header::HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|length| *length > 0)
        .map(|length| length as u64)
}

/// The list endpoint must return a JSON array of events.
fn parse_event_list(body: Value) -> Result<Vec<Event>> {
    if !body.is_array() {
        return Err(ApiError::InvalidResponse("expected an array of events".to_string()).into());
    }
    serde_json::from_value(body)
        .map_err(|e| ApiError::InvalidResponse(e.to_string()))
        .context("Failed to parse event list")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorKind;
    use serde_json::json;

    fn headers_with_length(value: &str) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_LENGTH,
            header::HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[test]
    fn test_declared_content_length() {
        assert_eq!(declared_content_length(&header::HeaderMap::new()), None);
        assert_eq!(declared_content_length(&headers_with_length("0")), None);
        assert_eq!(declared_content_length(&headers_with_length("-3")), None);
        assert_eq!(declared_content_length(&headers_with_length("abc")), None);
        assert_eq!(declared_content_length(&headers_with_length("17")), Some(17));
    }

    #[test]
    fn test_parse_event_list_requires_array() {
        let err = parse_event_list(json!({"events": []})).unwrap_err();
        assert_eq!(ApiError::kind_of(&err), Some(ErrorKind::Shape));

        let err = parse_event_list(json!([1, 2])).unwrap_err();
        assert_eq!(ApiError::kind_of(&err), Some(ErrorKind::Shape));

        let events = parse_event_list(json!([{"id": 1, "name": "A"}, {"id": 2}])).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].display_name(), "A");
    }

    #[test]
    fn test_urls() {
        let client = EventClient::new("http://localhost:5000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000/api/Events");
        assert_eq!(
            client.participants_url(&ResourceId::Number(42)),
            "http://localhost:5000/api/Events/42/participants"
        );
    }

    #[test]
    fn test_with_token_shares_cache() {
        let client = EventClient::new("http://localhost").unwrap();
        let authed = client.with_token("a.b.c".to_string());
        client.events().replace(vec![serde_json::from_value(json!({"name": "A"})).unwrap()]);
        assert_eq!(authed.events().len(), 1);

        let headers = authed.auth_headers().unwrap();
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer a.b.c");
        assert!(client.auth_headers().unwrap().is_empty());
    }
}
