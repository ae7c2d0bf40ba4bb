use crate::engine::{Storage, StorageInner};
use crate::error::{StorageError, StorageErrorExt};
use private::Sealed;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::fs;
use tracing::info;

#[derive(Debug, Default)]
pub struct NoRoot;
#[derive(Debug)]
pub struct WithRoot(PathBuf);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoRoot {}
impl Sealed for WithRoot {}

/// Typestate builder: a root directory must be chosen before [`StorageBuilder::connect`].
#[allow(private_bounds)]
#[derive(Debug)]
pub struct StorageBuilder<S: Sealed = NoRoot> {
    state: S,
    create: bool,
}

impl Default for StorageBuilder<NoRoot> {
    fn default() -> Self {
        Self { state: NoRoot, create: true }
    }
}

#[allow(private_bounds)]
impl<S: Sealed> StorageBuilder<S> {
    /// Whether a missing root directory is created (default `true`).
    #[must_use = "Sets whether the storage root should be created if it does not exist"]
    pub const fn create(mut self, enable: bool) -> Self {
        self.create = enable;
        self
    }
}

impl StorageBuilder<NoRoot> {
    #[must_use = "Creates a new storage builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the root directory path for the storage engine"]
    pub fn root(self, path: impl Into<PathBuf>) -> StorageBuilder<WithRoot> {
        StorageBuilder { state: WithRoot(path.into()), create: self.create }
    }
}

impl StorageBuilder<WithRoot> {
    /// Boots the store: creates the root when allowed, canonicalizes it so symlinked roots
    /// cannot be escaped, then purges temp files left by interrupted writes.
    ///
    /// Cleanup failures are logged and do not abort startup.
    ///
    /// # Errors
    /// Returns [`StorageError::Io`] if the root is missing with `create(false)` or cannot be
    /// created or resolved.
    pub async fn connect(self) -> Result<Storage, StorageError> {
        let root = &self.state.0;

        if self.create {
            fs::create_dir_all(root)
                .await
                .context(format!("Failed to bootstrap storage root: {}", root.display()))?;
        }

        let canonical = fs::canonicalize(root)
            .await
            .context(format!("Failed to resolve storage root: {}", root.display()))?;
        info!(path = %canonical.display(), "Blob store root ready");

        let storage = Storage {
            inner: Arc::new(StorageInner { root: canonical, tmp_counter: AtomicU64::new(1) }),
        };

        storage.purge_tmp().await;

        Ok(storage)
    }
}
