//! The seam between the membership monitor and whatever announces
//! storage backends.

use async_trait::async_trait;
use stow_types::Candidate;

use crate::error::DiscoveryError;

/// A source of storage-backend candidates.
///
/// `search` returns the full set of candidates currently matching
/// `criteria`; the caller diffs it against what it already tracks, so
/// repeating a candidate across calls is expected. An error must leave
/// the source itself usable for the next call.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn search(&self, criteria: &str) -> Result<Vec<Candidate>, DiscoveryError>;
}
