use crate::engine::Storage;
use crate::error::StorageError;
use crate::security;
use std::fmt;
use std::path::PathBuf;

/// A validated, case-preserving namespace name.
///
/// Vault ids are case-sensitive, so unlike path segments on some filesystems the name is kept
/// exactly as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceName(String);

impl TryFrom<String> for NamespaceName {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, StorageError> {
        security::validate_name(&value, "namespace")?;
        Ok(Self(value))
    }
}

impl TryFrom<&str> for NamespaceName {
    type Error = StorageError;

    fn try_from(value: &str) -> Result<Self, StorageError> {
        Self::try_from(value.to_owned())
    }
}

impl TryFrom<&String> for NamespaceName {
    type Error = StorageError;

    fn try_from(value: &String) -> Result<Self, StorageError> {
        Self::try_from(value.as_str())
    }
}

impl AsRef<str> for NamespaceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A namespaced view of the blob store.
///
/// Blob names are flat (no subdirectories) and are sharded by their first four characters
/// inside the namespace directory. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct NamespacedStorage {
    storage: Storage,
    namespace: NamespaceName,
}

impl NamespacedStorage {
    pub(crate) const fn new(storage: Storage, namespace: NamespaceName) -> Self {
        Self { storage, namespace }
    }

    #[must_use]
    pub const fn name(&self) -> &NamespaceName {
        &self.namespace
    }

    /// Physical location of a blob.
    ///
    /// # Errors
    /// [`StorageError::InvalidName`] for a malformed blob name,
    /// [`StorageError::PathTraversalAttempt`] if the result would leave the sandbox.
    pub fn resolve(&self, blob: &str) -> Result<PathBuf, StorageError> {
        self.storage.resolve_blob(&self.namespace, blob)
    }

    /// Reads a whole blob.
    ///
    /// # Errors
    /// [`StorageError::BlobNotFound`] if it does not exist.
    pub async fn read(&self, blob: &str) -> Result<Vec<u8>, StorageError> {
        self.storage.read_blob(&self.namespace, blob).await
    }

    /// Writes a blob atomically, replacing any previous content.
    ///
    /// # Errors
    /// [`StorageError::Io`] if the disk is full or the write cannot be synced.
    pub async fn write(&self, blob: &str, data: &[u8]) -> Result<(), StorageError> {
        self.storage.write_blob(&self.namespace, blob, data).await
    }

    /// # Errors
    /// [`StorageError::BlobNotFound`] if it does not exist.
    pub async fn delete(&self, blob: &str) -> Result<(), StorageError> {
        self.storage.delete_blob(&self.namespace, blob).await
    }

    /// # Errors
    /// Only for malformed names; a missing blob is `Ok(false)`.
    pub fn exists(&self, blob: &str) -> Result<bool, StorageError> {
        Ok(self.resolve(blob)?.is_file())
    }
}
