//! An [`ObjectStore`] wrapper that adds configurable random IO latency.
//!
//! `SlowStore` wraps any `Arc<dyn ObjectStore>` and sleeps for a random
//! duration before each operation. The RNG is seeded for deterministic,
//! reproducible behaviour across test runs.
//!
//! # Example
//!
//! ```ignore
//! let slow = SlowStore::new(inner)
//!     .read_latency(5, 20)    // 5 to 20 ms per read or probe
//!     .write_latency(10, 30)  // 10 to 30 ms per write
//!     .seed(42);
//! ```

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::error::StoreError;
use crate::traits::ObjectStore;

/// An [`ObjectStore`] wrapper that injects random latency before IO.
///
/// Useful for surfacing race conditions and probe-timeout behaviour that
/// never appear with an instant in-memory store.
pub struct SlowStore {
    inner: Arc<dyn ObjectStore>,
    read_latency_ms: (u64, u64),
    write_latency_ms: (u64, u64),
    rng: Mutex<StdRng>,
}

impl SlowStore {
    /// Wrap an existing store with zero latency (pass-through) by default.
    pub fn new(inner: Arc<dyn ObjectStore>) -> Self {
        Self {
            inner,
            read_latency_ms: (0, 0),
            write_latency_ms: (0, 0),
            rng: Mutex::new(StdRng::seed_from_u64(0)),
        }
    }

    /// Set the latency range for reads and health probes, in milliseconds.
    pub fn read_latency(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.read_latency_ms = (min_ms, max_ms);
        self
    }

    /// Set the write latency range in milliseconds (uniform random).
    pub fn write_latency(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.write_latency_ms = (min_ms, max_ms);
        self
    }

    /// Set the RNG seed for deterministic behaviour.
    pub fn seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    /// Sleep for a random duration in `[min, max]` milliseconds.
    async fn delay(&self, range: (u64, u64)) {
        let (min, max) = range;

        if max == 0 {
            return;
        }

        let ms = if min == max {
            min
        } else {
            self.rng.lock().expect("lock poisoned").random_range(min..=max)
        };

        if ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(ms)).await;
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for SlowStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        self.delay(self.write_latency_ms).await;
        self.inner.put(key, data).await
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        self.delay(self.read_latency_ms).await;
        self.inner.get(key).await
    }

    async fn healthcheck(&self) -> Result<bool, StoreError> {
        self.delay(self.read_latency_ms).await;
        self.inner.healthcheck().await
    }
}
