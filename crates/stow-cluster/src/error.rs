//! Error types for discovery and membership.

use stow_store::StoreError;
use stow_types::BackendId;
use thiserror::Error;

/// Errors produced by a [`Discovery`](crate::Discovery) source.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The discovery source could not be queried.
    #[error("discovery source error: {0}")]
    Source(String),

    /// A discovered entry was malformed and could not become a candidate.
    #[error("invalid candidate: {0}")]
    InvalidCandidate(String),
}

/// Errors produced by a membership sweep.
///
/// Any of these aborts the sweep that raised it; the tracked set and the
/// routing table are left as the sweep last wrote them. A backend merely
/// reporting itself offline is not an error, it is an eviction.
#[derive(Debug, Error)]
pub enum LocatorError {
    /// The discovery source could not be queried.
    #[error("discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// A health probe failed to run against a tracked backend.
    #[error("health probe failed for backend {id}")]
    HealthCheck {
        id: BackendId,
        #[source]
        source: StoreError,
    },

    /// A health probe did not answer within the configured timeout.
    #[error("health probe timed out for backend {id}")]
    ProbeTimeout { id: BackendId },

    /// A discovered candidate could not be connected.
    #[error("connect failed for candidate at {addr}")]
    Connect {
        addr: String,
        #[source]
        source: StoreError,
    },
}
