//! Storage handles for uploads and rendered artifacts.
//!
//! The pipeline never touches the filesystem directly; it goes through a
//! blob store keyed by filename (uploads) and an artifact store producing
//! deterministic derived paths (histogram images). Both are last-write-wins:
//! a second write to the same key silently replaces the first.

use std::fs;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::DataError;

/// Key-value store for raw uploaded files.
pub trait BlobStore: Send + Sync {
    /// Persist bytes under a key, overwriting any previous value.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), DataError>;

    /// Fetch the bytes stored under a key.
    fn get(&self, key: &str) -> Result<Vec<u8>, DataError>;
}

/// Store for rendered image artifacts, addressed by column name.
pub trait ArtifactStore: Send + Sync {
    /// The on-disk path for a column's histogram.
    ///
    /// A pure function of the column name: re-rendering the same column for
    /// a different file lands on the same path.
    fn path_for(&self, column: &str) -> PathBuf;
}

/// Filesystem-backed blob store rooted at a fixed upload directory.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open the store, creating its root directory if missing.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, DataError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(sanitize_key(key))
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), DataError> {
        let path = self.resolve(key);
        fs::write(&path, bytes)?;
        tracing::debug!(key, size = bytes.len(), "stored upload");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, DataError> {
        Ok(fs::read(self.resolve(key))?)
    }
}

/// In-memory blob store for tests and per-request isolation.
pub struct MemoryBlobStore {
    blobs: RwLock<AHashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(AHashMap::new()),
        }
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), DataError> {
        self.blobs
            .write()
            .insert(sanitize_key(key).to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, DataError> {
        self.blobs
            .read()
            .get(sanitize_key(key))
            .cloned()
            .ok_or_else(|| {
                DataError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no stored file named {key}"),
                ))
            })
    }
}

/// Filesystem-backed artifact store rooted at the graphs directory.
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Open the store, creating its root directory if missing.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, DataError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }
}

impl ArtifactStore for FsArtifactStore {
    fn path_for(&self, column: &str) -> PathBuf {
        self.root.join(format!("{}_histogram.png", sanitize_key(column)))
    }
}

/// Reduce a caller-supplied key to its final path component.
///
/// Keys are client-controlled filenames; stripping directory components
/// keeps them from escaping the store root.
fn sanitize_key(key: &str) -> &str {
    Path::new(key)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
}
