//! # Record Store
//!
//! In-memory tables for every persisted `DataFort` record, guarded by a single lock so
//! cascading deletes are atomic with respect to concurrent readers.
//!
//! The store only ever sees ciphertext. Credential and document rows hold exactly what the
//! key holder submitted; nothing here can decrypt them.
//!
//! ## Example
//!
//! ```rust
//! use dfort_database::Database;
//! use dfort_domain::records::UserRecord;
//!
//! let db = Database::builder().audit_capacity(128).build();
//! db.insert_user(UserRecord {
//!     id: "u1".into(),
//!     email: "a@example.com".into(),
//!     password_hash: "$argon2id$...".into(),
//!     kdf_salt: "00".repeat(32),
//!     created_at: chrono::Utc::now(),
//! })
//! .unwrap();
//!
//! assert!(db.user_exists("u1"));
//! ```

mod audit;
mod credentials;
mod documents;
mod error;
mod users;
mod vaults;

pub use documents::RemovedVault;
pub use error::{DatabaseError, DatabaseErrorExt};

use dfort_domain::audit::AuditEntry;
use dfort_domain::records::{CredentialRecord, DocumentRecord, UserRecord, VaultRecord};
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// A stored record plus its insertion sequence, used to break timestamp ties.
#[derive(Debug, Clone)]
struct Row<T> {
    seq: u64,
    record: T,
}

#[derive(Debug, Default)]
struct Tables {
    next_seq: u64,
    users: FxHashMap<String, UserRecord>,
    /// Email to user id.
    emails: FxHashMap<String, String>,
    vaults: FxHashMap<String, Row<VaultRecord>>,
    credentials: FxHashMap<String, Row<CredentialRecord>>,
    documents: FxHashMap<String, Row<DocumentRecord>>,
    /// Append-only, oldest first.
    audit: Vec<AuditEntry>,
}

impl Tables {
    fn seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

/// Newest first, insertion order breaking ties.
fn newest_first<'a, T, I, F>(rows: I, created: F) -> Vec<T>
where
    T: Clone + 'a,
    I: Iterator<Item = &'a Row<T>>,
    F: Fn(&T) -> chrono::DateTime<chrono::Utc>,
{
    let mut rows: Vec<_> = rows.collect();
    rows.sort_by(|a, b| {
        created(&b.record).cmp(&created(&a.record)).then_with(|| b.seq.cmp(&a.seq))
    });
    rows.into_iter().map(|row| row.record.clone()).collect()
}

/// Inner state of the [`Database`] wrapper.
#[derive(Debug)]
pub struct DatabaseInner {
    tables: RwLock<Tables>,
}

/// Cheaply cloneable handle to the shared record store.
#[derive(Debug, Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Creates a new [`DatabaseBuilder`].
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A fluent builder for the in-memory store.
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    audit_capacity: usize,
}

impl DatabaseBuilder {
    /// Creates a new [`DatabaseBuilder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocates room for this many audit entries.
    pub fn audit_capacity(mut self, capacity: usize) -> Self {
        self.audit_capacity = capacity;
        self
    }

    pub fn build(self) -> Database {
        let tables = Tables { audit: Vec::with_capacity(self.audit_capacity), ..Tables::default() };
        info!(audit_capacity = self.audit_capacity, "In-memory record store ready");

        Database { inner: Arc::new(DatabaseInner { tables: RwLock::new(tables) }) }
    }
}
