//! Object storage backends and the factory seam used to reach them.
//!
//! This crate provides:
//!
//! - [`ObjectStore`] — the whole-object storage trait (put/get/healthcheck).
//! - [`MemoryStore`] — a `RwLock<HashMap>` backend for tests and
//!   memory-only nodes.
//! - [`FileStore`] — one file per object with atomic writes.
//! - [`HttpStore`] — client for a remote node's object API.
//! - [`SlowStore`] — latency-injecting wrapper for timeout tests.
//! - [`StoreFactory`] — turns a discovered candidate into a live store.

mod error;
mod file_store;
mod http_store;
mod memory_store;
mod slow_store;
mod traits;

pub use error::StoreError;
pub use file_store::FileStore;
pub use http_store::{HttpStore, HttpStoreFactory};
pub use memory_store::MemoryStore;
pub use slow_store::SlowStore;
pub use traits::{ObjectStore, StoreFactory};
