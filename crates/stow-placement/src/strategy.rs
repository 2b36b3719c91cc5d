//! The placement seam between the router and its hashing schemes.

use std::hash::Hasher;

use fnv::FnvHasher;
use stow_types::BackendId;

/// Maps object keys to backends over a changing membership set.
///
/// Implementations are plain data structures with no interior mutability;
/// the router wraps them in its own lock together with the backend
/// registry, so membership and placement can never disagree.
pub trait PlacementStrategy: Send + Sync {
    /// Add a backend to the placement set.
    ///
    /// Adding a backend that is already present is a no-op.
    fn add_backend(&mut self, id: BackendId);

    /// Remove a backend from the placement set.
    ///
    /// Removing a backend that is not present is a no-op.
    fn remove_backend(&mut self, id: &BackendId);

    /// Resolve the backend that owns `key`, or `None` when the set is empty.
    ///
    /// Resolution is deterministic: the same key against the same membership
    /// names the same backend, across calls and across processes.
    fn locate(&self, key: &str) -> Option<BackendId>;
}

/// FNV-1a, 64-bit, unseeded.
pub(crate) fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(bytes);
    hasher.finish()
}
