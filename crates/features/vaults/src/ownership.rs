//! Ownership checks for everything that lives inside a vault.
//!
//! Every lookup walks the chain `resource -> vault -> user`; a resource is owned only when the
//! vault at the end of that walk belongs to the caller. Missing, malformed and foreign ids all
//! produce the same [`VaultError::NotFound`], so a caller cannot probe for other users' ids.

use crate::error::VaultError;
use async_trait::async_trait;
use dfort_database::{Database, DatabaseError};
use dfort_domain::audit::ResourceKind;
use dfort_kernel::security::ResourceGuard;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

/// Where a resource sits in the ownership hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerChain {
    pub vault_id: String,
    pub user_id: String,
}

/// Read side of the ownership hierarchy.
#[async_trait]
pub trait OwnershipLookup: Send + Sync + Debug {
    async fn owner_chain(&self, kind: ResourceKind, id: &str) -> Option<OwnerChain>;
}

#[async_trait]
impl OwnershipLookup for Database {
    async fn owner_chain(&self, kind: ResourceKind, id: &str) -> Option<OwnerChain> {
        match kind {
            ResourceKind::Vault => self
                .vault_owner(id)
                .map(|user_id| OwnerChain { vault_id: id.to_owned(), user_id }),
            ResourceKind::Credential => self
                .credential_owner(id)
                .map(|(vault_id, user_id)| OwnerChain { vault_id, user_id }),
            ResourceKind::Document => {
                self.document_owner(id).map(|(vault_id, user_id)| OwnerChain { vault_id, user_id })
            },
        }
    }
}

/// A resource the caller has been proven to own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    pub kind: ResourceKind,
    pub id: String,
    pub vault_id: String,
}

/// The uniform client-facing message for an unreachable resource of `kind`.
#[must_use]
pub const fn not_found_message(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Vault => "Vault not found.",
        ResourceKind::Credential => "Credential not found.",
        ResourceKind::Document => "Document not found.",
    }
}

pub(crate) fn not_found(kind: ResourceKind, reason: &'static str) -> VaultError {
    VaultError::NotFound { message: not_found_message(kind).into(), context: Some(reason.into()) }
}

/// Maps a rejected child insert. The store only refuses one for a missing parent, which means the
/// vault was deleted after the ownership check passed.
pub(crate) fn insert_failed(err: DatabaseError, context: &'static str) -> VaultError {
    match err {
        DatabaseError::NotFound { .. } => not_found(ResourceKind::Vault, "vault removed mid-request"),
        source => VaultError::Database { source, context: Some(context.into()) },
    }
}

#[derive(Debug, Clone)]
pub struct OwnershipGuard {
    lookup: Arc<dyn OwnershipLookup>,
}

impl OwnershipGuard {
    #[must_use]
    pub fn new(lookup: Arc<dyn OwnershipLookup>) -> Self {
        Self { lookup }
    }

    /// Proves `user_id` owns `resource_id` of the given kind.
    ///
    /// # Errors
    /// [`VaultError::NotFound`] with the kind's uniform message when the id is malformed, the
    /// resource or its vault is gone, or the vault belongs to someone else.
    pub async fn assert_owns(
        &self,
        resource_id: &str,
        kind: ResourceKind,
        user_id: &str,
    ) -> Result<ResourceHandle, VaultError> {
        let id = ResourceGuard::verify_id(resource_id, kind.as_str())
            .map_err(|_| not_found(kind, "malformed id"))?;

        let Some(chain) = self.lookup.owner_chain(kind, id).await else {
            debug!(%kind, id, "Ownership check: no such resource");
            return Err(not_found(kind, "missing"));
        };

        if chain.user_id != user_id {
            debug!(%kind, id, "Ownership check: foreign resource");
            return Err(not_found(kind, "foreign"));
        }

        Ok(ResourceHandle { kind, id: id.to_owned(), vault_id: chain.vault_id })
    }
}
