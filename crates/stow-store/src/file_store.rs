//! File-based object storage backend.
//!
//! Stores one file per object directly under the base directory.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::debug;

use crate::error::StoreError;
use crate::traits::ObjectStore;

/// File-backed object store, one file per key.
///
/// Keys are restricted to single path components (ASCII alphanumerics,
/// `_` and `-`), so a key can never name anything outside the base
/// directory. Writes are atomic: data lands in a `.tmp` file first and is
/// renamed into place, so a crashed write never leaves a half-written
/// object visible.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `base_dir`, creating the directory if
    /// needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Resolve the on-disk path for `key`.
    ///
    /// The allowed alphabet contains no `.`, which also keeps keys from
    /// colliding with the `.tmp` staging suffix.
    fn object_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if !valid {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.base_dir.join(key))
    }
}

#[async_trait::async_trait]
impl ObjectStore for FileStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        let path = self.object_path(key)?;

        // Atomic write: stage to a temp file, then rename into place.
        let tmp_path = path.with_extension("tmp");
        tokio::fs::write(&tmp_path, &data).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        debug!(key, path = %path.display(), size = data.len(), "stored object to file");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let path = self.object_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn healthcheck(&self) -> Result<bool, StoreError> {
        match tokio::fs::metadata(&self.base_dir).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
