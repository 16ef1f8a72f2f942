//! Typed client for the remote event store.
//!
//! Every CRUD verb maps to one HTTP call. Failures of any kind are reported as a
//! [`RequestError`] naming the operation that failed; callers never see reqwest
//! errors or the raw `{meta, result}` list envelope.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Event, EventId},
    protocol::{CreateEventData, EventListResponse, UpdateEventData},
};
use thiserror::Error;
use tracing::debug;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Fetch,
    Create,
    Update,
    Archive,
    Delete,
}

impl StoreOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreOperation::Fetch => "fetch",
            StoreOperation::Create => "create",
            StoreOperation::Update => "update",
            StoreOperation::Archive => "archive",
            StoreOperation::Delete => "delete",
        }
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestFailure {
    #[error("server responded with HTTP {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} request failed: {cause}")]
pub struct RequestError {
    pub operation: StoreOperation,
    #[source]
    pub cause: RequestFailure,
}

impl RequestError {
    pub fn new(operation: StoreOperation, cause: RequestFailure) -> Self {
        Self { operation, cause }
    }

    fn from_reqwest(operation: StoreOperation, err: reqwest::Error) -> Self {
        let cause = if let Some(status) = err.status() {
            RequestFailure::Status(status.as_u16())
        } else if err.is_decode() {
            RequestFailure::Decode(err.to_string())
        } else {
            RequestFailure::Transport(err.to_string())
        };
        Self::new(operation, cause)
    }
}

#[derive(Debug, Error)]
pub enum StoreConfigError {
    #[error("invalid event service url '{url}': {source}")]
    Parse {
        url: String,
        source: url::ParseError,
    },
    #[error("event service url '{0}' cannot carry a path")]
    NotABase(String),
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// The full remote collection, unordered.
    async fn list_events(&self) -> Result<Vec<Event>, RequestError>;
    async fn create_event(&self, data: &CreateEventData) -> Result<Event, RequestError>;
    async fn update_event(
        &self,
        id: &EventId,
        data: &UpdateEventData,
    ) -> Result<Event, RequestError>;
    /// Flips the archived flag server-side. Uses the full-replace verb, not the
    /// partial update one.
    async fn archive_event(&self, id: &EventId) -> Result<Event, RequestError>;
    async fn delete_event(&self, id: &EventId) -> Result<(), RequestError>;
}

#[async_trait]
impl<T> EventStore for Arc<T>
where
    T: EventStore + ?Sized,
{
    async fn list_events(&self) -> Result<Vec<Event>, RequestError> {
        (**self).list_events().await
    }

    async fn create_event(&self, data: &CreateEventData) -> Result<Event, RequestError> {
        (**self).create_event(data).await
    }

    async fn update_event(
        &self,
        id: &EventId,
        data: &UpdateEventData,
    ) -> Result<Event, RequestError> {
        (**self).update_event(id, data).await
    }

    async fn archive_event(&self, id: &EventId) -> Result<Event, RequestError> {
        (**self).archive_event(id).await
    }

    async fn delete_event(&self, id: &EventId) -> Result<(), RequestError> {
        (**self).delete_event(id).await
    }
}

#[derive(Debug, Clone)]
pub struct HttpEventStore {
    http: Client,
    base_url: Url,
}

impl HttpEventStore {
    pub fn new(base_url: &str) -> Result<Self, StoreConfigError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, StoreConfigError> {
        let parsed = Url::parse(base_url.trim()).map_err(|source| StoreConfigError::Parse {
            url: base_url.to_string(),
            source,
        })?;
        if parsed.cannot_be_a_base() {
            return Err(StoreConfigError::NotABase(base_url.to_string()));
        }
        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    /// Appends path segments to the base url; each segment is percent-encoded.
    fn endpoint(&self, operation: StoreOperation, segments: &[&str]) -> Result<Url, RequestError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                RequestError::new(
                    operation,
                    RequestFailure::InvalidUrl(self.base_url.to_string()),
                )
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn event_endpoint(&self, operation: StoreOperation, id: &EventId) -> Result<Url, RequestError> {
        self.endpoint(operation, &["events", id.as_str()])
    }
}

fn ensure_success(operation: StoreOperation, response: Response) -> Result<Response, RequestError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(RequestError::new(
            operation,
            RequestFailure::Status(status.as_u16()),
        ))
    }
}

async fn read_json<T: DeserializeOwned>(
    operation: StoreOperation,
    response: Response,
) -> Result<T, RequestError> {
    ensure_success(operation, response)?
        .json()
        .await
        .map_err(|err| RequestError::from_reqwest(operation, err))
}

#[async_trait]
impl EventStore for HttpEventStore {
    async fn list_events(&self) -> Result<Vec<Event>, RequestError> {
        let operation = StoreOperation::Fetch;
        let url = self.endpoint(operation, &["events"])?;
        debug!(%operation, %url, "event store request");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| RequestError::from_reqwest(operation, err))?;
        let envelope: EventListResponse = read_json(operation, response).await?;
        Ok(envelope.result)
    }

    async fn create_event(&self, data: &CreateEventData) -> Result<Event, RequestError> {
        let operation = StoreOperation::Create;
        let url = self.endpoint(operation, &["events"])?;
        debug!(%operation, %url, "event store request");
        let response = self
            .http
            .post(url)
            .json(data)
            .send()
            .await
            .map_err(|err| RequestError::from_reqwest(operation, err))?;
        read_json(operation, response).await
    }

    async fn update_event(
        &self,
        id: &EventId,
        data: &UpdateEventData,
    ) -> Result<Event, RequestError> {
        let operation = StoreOperation::Update;
        let url = self.event_endpoint(operation, id)?;
        debug!(%operation, %url, "event store request");
        let response = self
            .http
            .patch(url)
            .json(data)
            .send()
            .await
            .map_err(|err| RequestError::from_reqwest(operation, err))?;
        read_json(operation, response).await
    }

    async fn archive_event(&self, id: &EventId) -> Result<Event, RequestError> {
        let operation = StoreOperation::Archive;
        let url = self.event_endpoint(operation, id)?;
        debug!(%operation, %url, "event store request");
        let response = self
            .http
            .put(url)
            .send()
            .await
            .map_err(|err| RequestError::from_reqwest(operation, err))?;
        read_json(operation, response).await
    }

    async fn delete_event(&self, id: &EventId) -> Result<(), RequestError> {
        let operation = StoreOperation::Delete;
        let url = self.event_endpoint(operation, id)?;
        debug!(%operation, %url, "event store request");
        let response = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(|err| RequestError::from_reqwest(operation, err))?;
        ensure_success(operation, response)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
