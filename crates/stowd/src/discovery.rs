//! Static discovery backed by the config file.

use async_trait::async_trait;

use stow_cluster::{Discovery, DiscoveryError};
use stow_types::Candidate;

/// Discovery source over a fixed candidate list.
///
/// `search` narrows the list to ids containing `criteria`, the same way a
/// directory service would scope results to one router's pool. The list
/// never changes at runtime; liveness still comes from health probes, so
/// a static pool shrinks and regrows as nodes go down and come back.
pub struct StaticDiscovery {
    candidates: Vec<Candidate>,
}

impl StaticDiscovery {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }
}

#[async_trait]
impl Discovery for StaticDiscovery {
    async fn search(&self, criteria: &str) -> Result<Vec<Candidate>, DiscoveryError> {
        Ok(self
            .candidates
            .iter()
            .filter(|candidate| candidate.id.as_str().contains(criteria))
            .cloned()
            .collect())
    }
}
