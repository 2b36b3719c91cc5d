//! HTTP object storage backend.
//!
//! Speaks the object API served by stow node daemons: `PUT /object/{key}`,
//! `GET /object/{key}` and `GET /health`, with an optional bearer token of
//! the form `access:secret`.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::{Client, StatusCode};
use stow_types::{Candidate, ATTR_ACCESS_KEY, ATTR_SECRET_KEY};
use tracing::debug;

use crate::error::StoreError;
use crate::traits::{ObjectStore, StoreFactory};

/// Client for a remote node's object API.
pub struct HttpStore {
    client: Client,
    base_url: String,
    endpoint: String,
    bearer: Option<String>,
}

impl HttpStore {
    /// Create a client for the node at `addr` (`host:port`).
    pub fn new(addr: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("http://{addr}"),
            endpoint: addr.to_string(),
            bearer: None,
        }
    }

    /// Attach credentials, sent as `Authorization: Bearer access:secret`.
    pub fn with_credentials(mut self, access_key: &str, secret_key: &str) -> Self {
        self.bearer = Some(format!("{access_key}:{secret_key}"));
        self
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/object/{key}", self.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer {
            Some(token) => request.header("authorization", format!("Bearer {token}")),
            None => request,
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for HttpStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        let size = data.len();
        let request = self.authorize(self.client.put(self.object_url(key))).body(data);
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(StoreError::UnexpectedStatus {
                endpoint: self.endpoint.clone(),
                status: response.status().as_u16(),
            });
        }
        debug!(key, endpoint = %self.endpoint, size, "stored object on remote node");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let request = self.authorize(self.client.get(self.object_url(key)));
        let response = request.send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.bytes().await?)),
            status => Err(StoreError::UnexpectedStatus {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            }),
        }
    }

    async fn healthcheck(&self) -> Result<bool, StoreError> {
        // The health endpoint is served outside the node's auth layer.
        let response = self.client.get(format!("{}/health", self.base_url)).send().await;
        match response {
            Ok(response) => Ok(response.status().is_success()),
            // A refused connection is a dead backend, not a failed probe.
            Err(e) if e.is_connect() => Ok(false),
            Err(e) => Err(StoreError::Http(e)),
        }
    }
}

/// Factory that connects to discovered candidates over HTTP.
///
/// Credentials travel in the candidate's attributes under
/// [`ATTR_ACCESS_KEY`] and [`ATTR_SECRET_KEY`].
#[derive(Debug, Clone, Default)]
pub struct HttpStoreFactory;

impl HttpStoreFactory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl StoreFactory for HttpStoreFactory {
    async fn connect(&self, candidate: &Candidate) -> Result<Arc<dyn ObjectStore>, StoreError> {
        let mut store = HttpStore::new(&candidate.addr);
        if let (Some(access), Some(secret)) = (
            candidate.attribute(ATTR_ACCESS_KEY),
            candidate.attribute(ATTR_SECRET_KEY),
        ) {
            store = store.with_credentials(access, secret);
        }

        // Handshake: never hand out a store whose node is not serving.
        if !store.healthcheck().await? {
            return Err(StoreError::Unhealthy {
                endpoint: candidate.addr.clone(),
            });
        }
        debug!(id = %candidate.id, addr = %candidate.addr, "connected to backend");
        Ok(Arc::new(store))
    }
}
