//! Storage traits implemented by every backend.

use std::sync::Arc;

use bytes::Bytes;
use stow_types::Candidate;

use crate::error::StoreError;

/// Whole-object storage.
///
/// Implementations must be safe to share across tasks; the router calls
/// them concurrently through `Arc<dyn ObjectStore>`.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object under `key`, replacing any previous version.
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError>;

    /// Fetch the object stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    /// Probe whether the backend is serving.
    ///
    /// `Ok(false)` means the backend definitively reported itself offline.
    /// `Err` means the probe itself could not run; callers must not treat
    /// that as offline.
    async fn healthcheck(&self) -> Result<bool, StoreError>;
}

/// Builds a live store from a discovered candidate.
///
/// `connect` performs whatever one-time handshake the backend needs; a
/// candidate that fails to connect must not be registered.
#[async_trait::async_trait]
pub trait StoreFactory: Send + Sync {
    async fn connect(&self, candidate: &Candidate) -> Result<Arc<dyn ObjectStore>, StoreError>;
}
