//! Placement strategies for deterministic object-to-backend mapping.
//!
//! This crate provides:
//!
//! - [`PlacementStrategy`] — the seam between the router and its hashing
//!   scheme.
//! - [`HashModulo`] — modulo placement over a sorted backend set.
//! - [`ConsistentRing`] — consistent hashing with bounded partition loads.
//!
//! Both strategies hash with unseeded 64-bit FNV-1a, so placement agrees
//! across restarts and across processes.

mod hash_modulo;
mod ring;
mod strategy;

pub use hash_modulo::HashModulo;
pub use ring::{ConsistentRing, RingConfig};
pub use strategy::PlacementStrategy;
