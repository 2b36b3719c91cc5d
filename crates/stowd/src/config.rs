//! TOML configuration for the stow daemon.
//!
//! One file covers both roles; a router process reads `[router]`, `[ring]`
//! and `[[backend]]`, a storage node reads `[node]`. Every field has a
//! default, so an empty file (or none at all) is a valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use stow_cluster::LocatorConfig;
use stow_gateway::NodeAuth;
use stow_placement::RingConfig;
use stow_types::{Candidate, ATTR_ACCESS_KEY, ATTR_SECRET_KEY};

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Router process settings.
    pub router: RouterSection,
    /// Consistent-ring tuning.
    pub ring: RingSection,
    /// Storage-node process settings.
    pub node: NodeSection,
    /// Statically configured backends the router should adopt.
    #[serde(rename = "backend")]
    pub backends: Vec<BackendEntry>,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[router]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RouterSection {
    /// Address for the object HTTP API.
    pub listen_addr: String,
    /// Substring a backend id must contain to be adopted.
    pub criteria: String,
    /// Milliseconds between membership sweeps.
    pub poll_interval_ms: u64,
    /// Milliseconds a single health probe may take.
    pub probe_timeout_ms: u64,
    /// Placement strategy: `"ring"` (default) or `"modulo"`.
    pub strategy: String,
}

impl Default for RouterSection {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:7070".to_string(),
            criteria: "storage".to_string(),
            poll_interval_ms: 5_000,
            probe_timeout_ms: 2_000,
            strategy: "ring".to_string(),
        }
    }
}

/// `[ring]` section. Omitted fields fall back to the ring's own defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RingSection {
    /// Number of partitions keys hash into.
    pub partitions: Option<usize>,
    /// Virtual nodes per backend.
    pub replication_factor: Option<usize>,
    /// Load bound as a multiple of the average partitions per backend.
    /// Zero or negative disables the bound.
    pub load_factor: Option<f64>,
}

/// `[node]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NodeSection {
    /// Address for the node HTTP API.
    pub listen_addr: String,
    /// Directory for persistent object data.
    pub data_dir: PathBuf,
    /// Backend type: `"file"` (default) or `"memory"`.
    pub backend: String,
    /// Access key routers must present. Auth is enforced only when both
    /// keys are set.
    pub access_key: Option<String>,
    /// Secret key routers must present.
    pub secret_key: Option<String>,
}

impl Default for NodeSection {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .map(|h| h.join(".stow"))
            .unwrap_or_else(|| PathBuf::from(".stow"));
        Self {
            listen_addr: "0.0.0.0:7071".to_string(),
            data_dir,
            backend: "file".to_string(),
            access_key: None,
            secret_key: None,
        }
    }
}

/// One `[[backend]]` entry: a statically configured storage node.
#[derive(Debug, Deserialize)]
pub struct BackendEntry {
    /// Identifier the backend is registered under.
    pub id: String,
    /// Node API address, `host:port`.
    pub addr: String,
    /// Credentials the node requires, if any.
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                let config: CliConfig = toml::from_str(&content)?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Effective ring configuration.
    pub fn ring_config(&self) -> RingConfig {
        let defaults = RingConfig::default();
        RingConfig {
            partition_count: self.ring.partitions.unwrap_or(defaults.partition_count),
            replication_factor: self
                .ring
                .replication_factor
                .unwrap_or(defaults.replication_factor),
            load_factor: match self.ring.load_factor {
                None => defaults.load_factor,
                Some(f) if f <= 0.0 => None,
                Some(f) => Some(f),
            },
        }
    }

    /// Effective locator configuration.
    pub fn locator_config(&self) -> LocatorConfig {
        LocatorConfig {
            criteria: self.router.criteria.clone(),
            poll_interval: Duration::from_millis(self.router.poll_interval_ms),
            probe_timeout: Duration::from_millis(self.router.probe_timeout_ms),
        }
    }

    /// Statically configured backends as discovery candidates.
    pub fn candidates(&self) -> Vec<Candidate> {
        self.backends
            .iter()
            .map(|entry| {
                let mut candidate = Candidate::new(entry.id.as_str(), entry.addr.as_str());
                if let Some(access) = &entry.access_key {
                    candidate = candidate.with_attribute(ATTR_ACCESS_KEY, access.as_str());
                }
                if let Some(secret) = &entry.secret_key {
                    candidate = candidate.with_attribute(ATTR_SECRET_KEY, secret.as_str());
                }
                candidate
            })
            .collect()
    }

    /// Node credentials, present only when both keys are configured.
    pub fn node_auth(&self) -> Option<NodeAuth> {
        match (&self.node.access_key, &self.node.secret_key) {
            (Some(access), Some(secret)) => Some(NodeAuth::new(access.as_str(), secret.as_str())),
            _ => None,
        }
    }
}
