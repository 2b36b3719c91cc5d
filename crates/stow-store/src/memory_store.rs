//! In-memory object storage backend.

use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;
use tracing::debug;

use crate::error::StoreError;
use crate::traits::ObjectStore;

/// In-memory object store backed by a `RwLock<HashMap>`.
///
/// Useful for tests and for nodes configured to run in memory-only mode.
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects currently held.
    pub fn object_count(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        let mut map = self.objects.write().expect("lock poisoned");
        debug!(key, size = data.len(), "storing object in memory");
        map.insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    async fn healthcheck(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}
