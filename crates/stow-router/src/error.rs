//! Error types for the router.

use stow_store::StoreError;

/// Errors returned by [`Distributor`](crate::Distributor) operations.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// No object is stored under the requested key.
    #[error("object not found: {key}")]
    NotFound { key: String },

    /// No storage backend is currently registered.
    #[error("no storage backends available")]
    NoBackends,

    /// The owning backend failed the operation.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
