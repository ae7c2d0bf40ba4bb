//! Vaults feature slice: owner-scoped vaults and the sealed credentials and documents inside
//! them.
//!
//! The server stores ciphertext exactly as the key holder sent it. Credential and document
//! routes take the guarded path through [`VaultBoundary`]: ownership is proven through the
//! vault before anything is read or written, and every attempt lands in the audit trail.

mod boundary;
mod error;
mod handlers;
pub mod models;
mod ownership;
mod validate;

#[cfg(test)]
mod fixtures;

pub use crate::boundary::{GuardedCall, Target, VaultBoundary};
pub use crate::error::{VaultError, VaultErrorExt};
pub use crate::ownership::{
    OwnerChain, OwnershipGuard, OwnershipLookup, ResourceHandle, not_found_message,
};

use axum::extract::DefaultBodyLimit;
use dfort_audit::AuditRecorder;
use dfort_database::Database;
use dfort_domain::config::ApiConfig;
use dfort_kernel::domain::registry::InitializedSlice;
use dfort_kernel::server::ApiState;
use dfort_storage::Storage;
use std::sync::Arc;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Headroom for multipart boundaries and the small text parts next to the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Vaults feature state
#[dfort_derive::feature_slice]
pub struct Vaults {
    pub boundary: VaultBoundary,
    database: Database,
    storage: Storage,
    upload_limit: usize,
}

/// Initialize the vaults feature. Audit entries go to `recorder`.
///
/// # Errors
/// [`VaultError::Internal`] for a zero upload limit.
pub fn init(
    config: &ApiConfig,
    database: &Database,
    storage: &Storage,
    recorder: AuditRecorder,
) -> Result<InitializedSlice, VaultError> {
    let upload_limit = config.upload.max_bytes;
    if upload_limit == 0 {
        return Err(VaultError::Internal {
            message: "upload limit must be positive".into(),
            context: Some("upload.max_bytes".into()),
        });
    }

    let ownership = OwnershipGuard::new(Arc::new(database.clone()));
    let inner = VaultsInner {
        boundary: VaultBoundary::new(ownership, recorder),
        database: database.clone(),
        storage: storage.clone(),
        upload_limit,
    };

    tracing::info!(upload_limit, "Vaults slice initialized");
    Ok(InitializedSlice::new(Vaults::new(inner)))
}

/// Vault, credential and document routes.
pub fn router(config: &ApiConfig) -> OpenApiRouter<ApiState> {
    let uploads = OpenApiRouter::new()
        .routes(routes!(handlers::documents::upload_document))
        .layer(DefaultBodyLimit::max(config.upload.max_bytes.saturating_add(MULTIPART_OVERHEAD)));

    OpenApiRouter::new()
        .routes(routes!(handlers::vaults::list_vaults, handlers::vaults::create_vault))
        .routes(routes!(
            handlers::vaults::get_vault,
            handlers::vaults::update_vault,
            handlers::vaults::delete_vault
        ))
        .routes(routes!(handlers::credentials::list_credentials))
        .routes(routes!(handlers::credentials::create_credential))
        .routes(routes!(
            handlers::credentials::update_credential,
            handlers::credentials::delete_credential
        ))
        .routes(routes!(handlers::documents::list_documents))
        .routes(routes!(handlers::documents::download_document))
        .routes(routes!(handlers::documents::delete_document))
        .merge(uploads)
}
