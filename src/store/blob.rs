//! Binary payload storage.
//!
//! Blobs are addressed by a logical relative path such as
//! `covers/pirate.jpg`. Absolute paths and `..` components are rejected so a
//! caller can never reach outside the storage root.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::{CourierError, Result};

/// Storage for whole binary payloads.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `bytes` at `path`, replacing any previous blob. Readers see
    /// either the old blob or the complete new one.
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<()>;

    /// Read a whole blob.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Remove a blob. Removing a missing blob is not an error.
    async fn remove(&self, path: &str) -> Result<()>;
}

/// Check that `path` is a non-empty relative path without `..`.
pub fn validate_blob_path(path: &str) -> Result<PathBuf> {
    let invalid = |why: &str| CourierError::InvalidArgument(format!("image path {path:?} {why}"));

    if path.trim().is_empty() {
        return Err(invalid("is empty"));
    }
    let candidate = Path::new(path);
    let mut clean = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir => return Err(invalid("must not contain '..'")),
            Component::RootDir | Component::Prefix(_) => return Err(invalid("must be relative")),
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(invalid("names no file"));
    }
    Ok(clean)
}

/// [`BlobStore`] backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        Ok(self.root.join(validate_blob_path(path)?))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write next to the target and rename over it once complete.
        let mut partial = target.clone().into_os_string();
        partial.push(".partial");
        let partial = PathBuf::from(partial);

        let written = async {
            let mut file = fs::File::create(&partial).await?;
            file.write_all(bytes).await?;
            file.flush().await?;
            file.sync_all().await?;
            Ok::<_, std::io::Error>(())
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&partial).await;
            return Err(e.into());
        }
        fs::rename(&partial, &target).await?;
        debug!(path = %target.display(), bytes = bytes.len(), "blob written");
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let target = self.resolve(path)?;
        match fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CourierError::not_found("blob", path))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        match fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// [`BlobStore`] held in memory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let key = validate_blob_path(path)?;
        let mut blobs = self
            .blobs
            .write()
            .map_err(|e| CourierError::Store(format!("failed to acquire write lock: {e}")))?;
        blobs.insert(key, bytes.to_vec());
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let key = validate_blob_path(path)?;
        let blobs = self
            .blobs
            .read()
            .map_err(|e| CourierError::Store(format!("failed to acquire read lock: {e}")))?;
        blobs
            .get(&key)
            .cloned()
            .ok_or_else(|| CourierError::not_found("blob", path))
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let key = validate_blob_path(path)?;
        let mut blobs = self
            .blobs
            .write()
            .map_err(|e| CourierError::Store(format!("failed to acquire write lock: {e}")))?;
        blobs.remove(&key);
        Ok(())
    }
}
