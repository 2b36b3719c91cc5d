//! The object router: placement and backend registry behind one lock.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use stow_placement::PlacementStrategy;
use stow_store::ObjectStore;
use stow_types::BackendId;
use tracing::{debug, info};

use crate::error::RouterError;

struct Inner {
    stores: HashMap<BackendId, Arc<dyn ObjectStore>>,
    strategy: Box<dyn PlacementStrategy>,
}

/// Routes object operations to the backend that owns each key.
///
/// Membership and placement live behind a single lock, so a lookup can
/// never name a backend whose handle has already been dropped. The lock is
/// held only while resolving a key; object IO runs outside it, on a cloned
/// handle.
pub struct Distributor {
    inner: RwLock<Inner>,
}

impl Distributor {
    /// Create a router with no backends, delegating placement to
    /// `strategy`.
    pub fn new(strategy: Box<dyn PlacementStrategy>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                stores: HashMap::new(),
                strategy,
            }),
        }
    }

    /// Register a backend under `id`. Re-registering an id replaces its
    /// handle.
    pub fn add_store(&self, id: BackendId, store: Arc<dyn ObjectStore>) {
        let mut inner = self.inner.write().expect("lock poisoned");
        inner.strategy.add_backend(id.clone());
        inner.stores.insert(id.clone(), store);
        info!(%id, backends = inner.stores.len(), "registered backend");
    }

    /// Deregister a backend. Unknown ids are a no-op.
    pub fn remove_store(&self, id: &BackendId) {
        let mut inner = self.inner.write().expect("lock poisoned");
        if inner.stores.remove(id).is_some() {
            inner.strategy.remove_backend(id);
            info!(%id, backends = inner.stores.len(), "deregistered backend");
        }
    }

    /// Ids of all registered backends, sorted.
    pub fn backend_ids(&self) -> Vec<BackendId> {
        let inner = self.inner.read().expect("lock poisoned");
        let mut ids: Vec<_> = inner.stores.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of registered backends.
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").stores.len()
    }

    /// Whether no backend is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve the backend owning `key` and clone its handle.
    ///
    /// The read guard lives only for the duration of this call; callers
    /// perform IO on the returned handle without holding the lock.
    fn resolve(&self, key: &str) -> Result<(BackendId, Arc<dyn ObjectStore>), RouterError> {
        let inner = self.inner.read().expect("lock poisoned");
        if inner.stores.is_empty() {
            return Err(RouterError::NoBackends);
        }
        let id = inner.strategy.locate(key).ok_or(RouterError::NoBackends)?;
        let store = inner
            .stores
            .get(&id)
            .cloned()
            .ok_or_else(|| RouterError::NotFound {
                key: key.to_string(),
            })?;
        Ok((id, store))
    }

    /// Store an object on the backend that owns `key`.
    pub async fn put_object(&self, key: &str, data: Bytes) -> Result<(), RouterError> {
        let (id, store) = self.resolve(key)?;
        debug!(key, backend = %id, size = data.len(), "routing put");
        store.put(key, data).await?;
        Ok(())
    }

    /// Fetch the object stored under `key`.
    ///
    /// A key whose owning backend holds no such object is `NotFound`; the
    /// router never consults other backends.
    pub async fn get_object(&self, key: &str) -> Result<Bytes, RouterError> {
        let (id, store) = self.resolve(key)?;
        debug!(key, backend = %id, "routing get");
        match store.get(key).await? {
            Some(data) => Ok(data),
            None => Err(RouterError::NotFound {
                key: key.to_string(),
            }),
        }
    }
}
