//! Core types shared across the stow workspace.
//!
//! Everything here is plain data: [`BackendId`] names a storage backend,
//! [`Candidate`] describes a backend announced by a discovery source before
//! the router has connected to it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Attribute key under which discovery advertises a backend's access key.
pub const ATTR_ACCESS_KEY: &str = "access_key";

/// Attribute key under which discovery advertises a backend's secret key.
pub const ATTR_SECRET_KEY: &str = "secret_key";

/// Stable identifier of a storage backend.
///
/// Identifiers are opaque strings chosen by the operator or derived by a
/// discovery source. Placement hashes the identifier, so renaming a backend
/// moves the objects it owns.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendId(String);

impl BackendId {
    /// Create an identifier from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BackendId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BackendId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BackendId({})", self.0)
    }
}

/// A storage backend announced by a discovery source.
///
/// A candidate is not yet part of the cluster. The locator connects to
/// `addr` through a store factory and only then registers the backend
/// under `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Identifier the backend will be registered under.
    pub id: BackendId,
    /// Network address of the backend, `host:port`.
    pub addr: String,
    /// Free-form metadata reported by discovery (credentials, labels).
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Candidate {
    /// Create a candidate with no attributes.
    pub fn new(id: impl Into<BackendId>, addr: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            addr: addr.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Attach an attribute, builder style.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Look up an attribute by key.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}
