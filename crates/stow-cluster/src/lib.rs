//! Backend discovery and health-driven membership.
//!
//! This crate keeps a routing table in step with the world. A
//! [`Locator`] periodically probes the backends it already tracks,
//! deregisters the ones that report themselves offline, and asks a
//! [`Discovery`] source for new candidates to connect and register with
//! a [`Distributor`](stow_router::Distributor).
//!
//! [`locator::start`] spawns the sweep loop on the tokio runtime and
//! returns a [`LocatorHandle`] for graceful shutdown.

mod discovery;
mod error;
pub mod locator;


pub use discovery::Discovery;
pub use error::{DiscoveryError, LocatorError};
pub use locator::{start, Locator, LocatorConfig, LocatorHandle};
