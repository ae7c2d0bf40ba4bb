//! Audit feature slice.
//!
//! Records who touched which resource, when and from where; never what the resource contains.
//! Recording is best-effort and asynchronous (see [`AuditRecorder`]); reading is the paginated
//! `GET /audit` route scoped to the caller.

mod error;
mod handlers;
pub mod models;
mod recorder;
mod sink;

pub use crate::error::{AuditError, AuditErrorExt};
pub use crate::recorder::AuditRecorder;
pub use crate::sink::AuditSink;

use dfort_database::Database;
use dfort_domain::config::ApiConfig;
use dfort_kernel::domain::registry::InitializedSlice;
use dfort_kernel::server::ApiState;
use std::sync::Arc;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Audit feature inner state.
#[dfort_derive::feature_slice]
pub struct Audit {
    pub recorder: AuditRecorder,
    database: Database,
}

/// Starts the drain task and returns the typed slice, for callers that need the recorder
/// before registering the slice.
///
/// Must be called from within a Tokio runtime.
///
/// # Errors
/// [`AuditError::Internal`] for a zero queue capacity.
pub fn start(config: &ApiConfig, database: &Database) -> Result<Audit, AuditError> {
    let capacity = config.audit.queue_capacity;
    if capacity == 0 {
        return Err(AuditError::Internal {
            message: "queue capacity must be positive".into(),
            context: Some("audit.queue_capacity".into()),
        });
    }

    // The drain task ends on its own once every recorder clone is dropped.
    let (recorder, _worker) = AuditRecorder::spawn(Arc::new(database.clone()), capacity);
    tracing::info!(capacity, "Audit slice initialized");

    Ok(Audit::new(AuditInner { recorder, database: database.clone() }))
}

/// Initialize the audit feature.
///
/// # Errors
/// See [`start`].
pub fn init(config: &ApiConfig, database: &Database) -> Result<InitializedSlice, AuditError> {
    start(config, database).map(InitializedSlice::new)
}

pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new().routes(routes!(handlers::list_audit_logs))
}
