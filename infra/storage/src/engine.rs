//! Core blob engine: sandboxed, atomic file I/O under a canonical root.

use crate::builder::StorageBuilder;
use crate::error::{StorageError, StorageErrorExt};
use crate::maintenance;
use crate::namespace::{NamespaceName, NamespacedStorage};
use crate::security;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Marker embedded in temp file names; [`maintenance`] purges stale ones.
pub(crate) const TMP_MARKER: &str = ".dforttmp.";

/// The internal shared state of a [`Storage`] instance.
#[derive(Debug)]
pub(crate) struct StorageInner {
    /// The canonicalized physical path on the disk where all blobs are stored.
    pub(crate) root: PathBuf,
    pub(crate) tmp_counter: AtomicU64,
}

/// A thread-safe handle to the blob store.
///
/// Internally reference-counted; clone it freely across tasks. All data access goes through a
/// [`NamespacedStorage`] obtained from [`Storage::namespace`].
#[derive(Debug, Clone)]
pub struct Storage {
    pub(crate) inner: Arc<StorageInner>,
}

impl Storage {
    #[must_use = "The storage engine is not initialized until you call .connect()"]
    pub fn builder() -> StorageBuilder {
        StorageBuilder::new()
    }

    /// Canonical root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// Returns a view scoped to one namespace (a vault id in practice).
    ///
    /// # Errors
    /// Returns [`StorageError::InvalidName`] if the name is empty or contains anything other
    /// than ASCII letters, digits, `_` or `-`.
    pub fn namespace<N>(&self, name: N) -> Result<NamespacedStorage, StorageError>
    where
        N: TryInto<NamespaceName, Error = StorageError>,
    {
        Ok(NamespacedStorage::new(self.clone(), name.try_into()?))
    }

    /// Deletes a namespace directory with every blob inside it.
    ///
    /// Returns `false` when the namespace never held anything.
    ///
    /// # Errors
    /// [`StorageError::InvalidName`] for a malformed name, [`StorageError::Io`] when removal fails.
    pub async fn remove_namespace<N>(&self, name: N) -> Result<bool, StorageError>
    where
        N: TryInto<NamespaceName, Error = StorageError>,
    {
        let name = name.try_into()?;
        let dir = security::resolve_path(&self.inner.root, name.as_ref())?;

        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!(namespace = %name, "Namespace removed");
                Ok(true)
            },
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StorageError::Io {
                source: err,
                context: Some(format!("Failed to remove namespace {name}").into()),
            }),
        }
    }

    pub(crate) fn resolve_blob(
        &self,
        namespace: &NamespaceName,
        blob: &str,
    ) -> Result<PathBuf, StorageError> {
        security::resolve_sharded(&self.inner.root, namespace.as_ref(), blob)
    }

    pub(crate) async fn read_blob(
        &self,
        namespace: &NamespaceName,
        blob: &str,
    ) -> Result<Vec<u8>, StorageError> {
        let resolved = self.resolve_blob(namespace, blob)?;

        match fs::read(&resolved).await {
            Ok(data) => Ok(data),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(StorageError::BlobNotFound {
                message: blob.to_owned().into(),
                context: Some(namespace.to_string().into()),
            }),
            Err(err) => Err(StorageError::Io {
                source: err,
                context: Some(format!("Read failed: {}", resolved.display()).into()),
            }),
        }
    }

    /// Atomic swap: unique temp file, fsync, rename, directory sync.
    pub(crate) async fn write_blob(
        &self,
        namespace: &NamespaceName,
        blob: &str,
        data: &[u8],
    ) -> Result<(), StorageError> {
        let resolved = self.resolve_blob(namespace, blob)?;

        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent)
                .await
                .context(format!("Failed to create shards for {}", resolved.display()))?;
        }

        let temp = unique_tmp_path(&resolved, &self.inner.tmp_counter);
        if let Err(err) = write_synced(&temp, data).await {
            let _ = fs::remove_file(&temp).await;
            return Err(err);
        }

        if let Err(err) = fs::rename(&temp, &resolved).await {
            let _ = fs::remove_file(&temp).await;
            return Err(StorageError::Io {
                source: err,
                context: Some(
                    format!("Atomic swap failed: {} -> {}", temp.display(), resolved.display())
                        .into(),
                ),
            });
        }

        if let Some(parent) = resolved.parent() {
            sync_dir(parent).await;
        }

        debug!(namespace = %namespace, bytes = data.len(), "Blob saved atomically");
        Ok(())
    }

    pub(crate) async fn delete_blob(
        &self,
        namespace: &NamespaceName,
        blob: &str,
    ) -> Result<(), StorageError> {
        let resolved = self.resolve_blob(namespace, blob)?;

        match fs::remove_file(&resolved).await {
            Ok(()) => {
                debug!(namespace = %namespace, "Blob deleted");
                Ok(())
            },
            Err(err) if err.kind() == ErrorKind::NotFound => Err(StorageError::BlobNotFound {
                message: blob.to_owned().into(),
                context: Some(namespace.to_string().into()),
            }),
            Err(err) => Err(StorageError::Io {
                source: err,
                context: Some(format!("Failed to delete: {}", resolved.display()).into()),
            }),
        }
    }

    pub async fn purge_tmp(&self) {
        maintenance::purge_tmp(&self.inner.root).await;
    }
}

async fn write_synced(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    let mut file = fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(path)
        .await
        .context(format!("Temp creation failed: {}", path.display()))?;
    file.write_all(data).await.context("Write failed")?;
    file.sync_all().await.context("Hardware sync failed")?;
    Ok(())
}

async fn sync_dir(path: &Path) {
    match fs::File::open(path).await {
        Ok(dir) => {
            if let Err(err) = dir.sync_all().await {
                warn!(path = %path.display(), error = %err, "Directory sync failed");
            }
        },
        Err(err) => warn!(path = %path.display(), error = %err, "Directory open failed"),
    }
}

fn unique_tmp_path(target: &Path, counter: &AtomicU64) -> PathBuf {
    let counter = counter.fetch_add(1, Ordering::Relaxed);
    let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or("blob");
    target.with_file_name(format!("{file_name}{TMP_MARKER}{counter}"))
}
