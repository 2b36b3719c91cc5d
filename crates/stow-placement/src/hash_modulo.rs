//! Modulo placement over a sorted backend set.

use std::collections::BTreeSet;

use stow_types::BackendId;
use tracing::debug;

use crate::strategy::{fnv1a, PlacementStrategy};

/// Places a key on `backends[fnv1a(key) % len]`.
///
/// Backends live in a sorted set, so the index of each backend is stable
/// for a given membership no matter what order backends were added in.
/// Any membership change renumbers the set and remaps most keys; use
/// [`ConsistentRing`](crate::ConsistentRing) when that matters.
#[derive(Debug, Clone, Default)]
pub struct HashModulo {
    backends: BTreeSet<BackendId>,
}

impl HashModulo {
    /// Create an empty placement set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of backends in the set.
    pub fn member_count(&self) -> usize {
        self.backends.len()
    }
}

impl PlacementStrategy for HashModulo {
    fn add_backend(&mut self, id: BackendId) {
        if self.backends.insert(id.clone()) {
            debug!(%id, "added backend");
        }
    }

    fn remove_backend(&mut self, id: &BackendId) {
        if self.backends.remove(id) {
            debug!(%id, "removed backend");
        }
    }

    fn locate(&self, key: &str) -> Option<BackendId> {
        if self.backends.is_empty() {
            return None;
        }
        let index = (fnv1a(key.as_bytes()) % self.backends.len() as u64) as usize;
        self.backends.iter().nth(index).cloned()
    }
}
