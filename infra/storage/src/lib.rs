//! Sandboxed blob store for encrypted document bodies.
//!
//! The store never interprets what it holds: every blob is ciphertext produced by a key
//! holder, written and read back byte for byte. Blobs live under one namespace per vault so a
//! vault deletion can drop all of its documents at once.
//!
//! # Core Features
//!
//! - **Sandbox Security**: names are validated and every resolved path is checked against the
//!   canonical root, including symlinked parents.
//! - **Atomic Writes**: unique temp file, `fsync`, `rename`, then a directory sync.
//! - **Sharding**: `<root>/<namespace>/<ab>/<cd>/<blob>` keeps directories small.
//! - **Self-Healing**: stale temp files from a crashed write are purged on startup.
//!
//! # Examples
//!
//! ```rust
//! use dfort_storage::{Storage, StorageError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StorageError> {
//!     # let tmp = tempfile::tempdir().unwrap();
//!     # let root = tmp.path().join("blobs");
//!     let storage = Storage::builder().root(&root).create(true).connect().await?;
//!
//!     let vault = storage.namespace("V4ult1d")?;
//!     vault.write("Bl0bKey9", b"\x8f\x02ciphertext").await?;
//!     assert_eq!(vault.read("Bl0bKey9").await?, b"\x8f\x02ciphertext");
//!
//!     storage.remove_namespace("V4ult1d").await?;
//!     assert!(!vault.exists("Bl0bKey9")?);
//!     Ok(())
//! }
//! ```

mod builder;
mod engine;
mod error;
mod maintenance;
mod namespace;
mod security;

pub use builder::{NoRoot, StorageBuilder, WithRoot};
pub use engine::Storage;
pub use error::{StorageError, StorageErrorExt};
pub use namespace::{NamespaceName, NamespacedStorage};
