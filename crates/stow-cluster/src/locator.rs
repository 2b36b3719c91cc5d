//! The membership monitor.
//!
//! A [`Locator`] owns the link between discovery and routing. Each
//! sweep first probes every tracked backend and deregisters the ones
//! that report themselves offline, then connects any newly discovered
//! candidates and registers them. Probing before discovering means a
//! backend that flapped between sweeps is evicted before it can be
//! re-added with a stale connection.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use stow_router::Distributor;
use stow_store::{ObjectStore, StoreFactory};
use stow_types::BackendId;

use crate::discovery::Discovery;
use crate::error::LocatorError;

/// Configuration for the sweep loop.
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    /// Search string handed to the discovery source on every sweep.
    pub criteria: String,
    /// Time between sweeps.
    pub poll_interval: Duration,
    /// Upper bound on a single health probe.
    pub probe_timeout: Duration,
}

impl LocatorConfig {
    /// Fast timings for tests.
    pub fn test_config() -> Self {
        Self {
            criteria: String::new(),
            poll_interval: Duration::from_millis(20),
            probe_timeout: Duration::from_millis(100),
        }
    }

    /// Production timings.
    pub fn default_config(criteria: impl Into<String>) -> Self {
        Self {
            criteria: criteria.into(),
            poll_interval: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(2),
        }
    }
}

/// A backend the locator has connected and registered.
struct TrackedBackend {
    id: BackendId,
    store: Arc<dyn ObjectStore>,
}

/// Keeps a [`Distributor`]'s registry in step with discovery and health.
pub struct Locator {
    config: LocatorConfig,
    discovery: Arc<dyn Discovery>,
    factory: Arc<dyn StoreFactory>,
    distributor: Arc<Distributor>,
    /// Connected backends keyed by address. The address is the identity
    /// discovery reports, so it is what dedupes repeat candidates.
    tracked: Mutex<BTreeMap<String, TrackedBackend>>,
}

impl Locator {
    pub fn new(
        config: LocatorConfig,
        discovery: Arc<dyn Discovery>,
        factory: Arc<dyn StoreFactory>,
        distributor: Arc<Distributor>,
    ) -> Self {
        Self {
            config,
            discovery,
            factory,
            distributor,
            tracked: Mutex::new(BTreeMap::new()),
        }
    }

    /// Run one sweep: health first, then discovery.
    ///
    /// An error aborts the sweep where it happened; evictions and
    /// registrations already applied stay applied, and the next sweep
    /// starts from that state.
    pub async fn tick(&self) -> Result<(), LocatorError> {
        self.sweep_health().await?;
        self.sweep_discovery().await
    }

    /// Probe every tracked backend, evicting the ones that report
    /// themselves offline.
    ///
    /// A probe that answers `Ok(false)` is a definitive answer and the
    /// backend is deregistered. A probe that errors or times out is not
    /// an answer at all, so the sweep aborts rather than guess.
    async fn sweep_health(&self) -> Result<(), LocatorError> {
        let snapshot: Vec<(String, BackendId, Arc<dyn ObjectStore>)> = {
            let tracked = self.tracked.lock().await;
            tracked
                .iter()
                .map(|(addr, backend)| (addr.clone(), backend.id.clone(), backend.store.clone()))
                .collect()
        };

        for (addr, id, store) in snapshot {
            let probe = tokio::time::timeout(self.config.probe_timeout, store.healthcheck()).await;

            match probe {
                Err(_) => return Err(LocatorError::ProbeTimeout { id }),
                Ok(Err(source)) => return Err(LocatorError::HealthCheck { id, source }),
                Ok(Ok(true)) => {}
                Ok(Ok(false)) => {
                    self.tracked.lock().await.remove(&addr);
                    self.distributor.remove_store(&id);
                    info!(%id, addr, "backend offline, deregistered");
                }
            }
        }

        Ok(())
    }

    /// Connect and register every discovered candidate not already
    /// tracked.
    async fn sweep_discovery(&self) -> Result<(), LocatorError> {
        let candidates = self.discovery.search(&self.config.criteria).await?;

        for candidate in candidates {
            if self.tracked.lock().await.contains_key(&candidate.addr) {
                continue;
            }

            let store =
                self.factory
                    .connect(&candidate)
                    .await
                    .map_err(|source| LocatorError::Connect {
                        addr: candidate.addr.clone(),
                        source,
                    })?;

            self.tracked.lock().await.insert(
                candidate.addr.clone(),
                TrackedBackend {
                    id: candidate.id.clone(),
                    store: store.clone(),
                },
            );
            self.distributor.add_store(candidate.id.clone(), store);
            info!(id = %candidate.id, addr = %candidate.addr, "backend registered");
        }

        Ok(())
    }

    /// Number of backends currently tracked.
    pub async fn tracked_count(&self) -> usize {
        self.tracked.lock().await.len()
    }
}

/// Handle to a running locator loop.
pub struct LocatorHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl LocatorHandle {
    /// Signal shutdown and wait for the loop to finish its current
    /// sweep and exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }

    /// Check whether the sweep loop is still running.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Spawn the sweep loop and return a handle to it.
pub fn start(locator: Locator) -> LocatorHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        info!("locator started");
        let mut interval = tokio::time::interval(locator.config.poll_interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(error) = locator.tick().await {
                        warn!(%error, "membership sweep failed");
                    }
                }
                _ = shutdown_rx.changed() => {
                    info!("locator shutting down");
                    break;
                }
            }
        }

        info!("locator stopped");
    });

    LocatorHandle { shutdown_tx, task }
}
