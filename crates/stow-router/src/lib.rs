//! Object routing over pluggable placement.
//!
//! The [`Distributor`] owns the backend registry and a placement strategy
//! behind a single lock. Each put/get resolves the backend that owns the
//! key and performs the IO on that backend alone, while the membership
//! monitor adds and removes backends concurrently.

mod distributor;
mod error;

pub use distributor::Distributor;
pub use error::RouterError;
