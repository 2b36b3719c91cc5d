//! Error types for storage backends.

/// Errors produced by object storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem-level failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level failure talking to a remote backend.
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote backend answered with a status the operation does not
    /// allow.
    #[error("unexpected status {status} from {endpoint}")]
    UnexpectedStatus { endpoint: String, status: u16 },

    /// The backend refused service during the connect handshake.
    #[error("backend unhealthy: {endpoint}")]
    Unhealthy { endpoint: String },

    /// The key cannot be stored by this backend.
    #[error("invalid object key: {key:?}")]
    InvalidKey { key: String },
}
