//! Facade crate for `DataFort` features and shared modules.
//! Re-exports domain/kernel primitives and aggregates feature initialization.
//! Keep this crate thin: it composes other crates and implements no business logic.
//!
//! ## Usage
//! - Add `dfort` with the `server` feature (on by default).
//! - Call [`init`] to build the feature slices, then mount [`router`] under `/api`.

pub use dfort_domain as domain;
pub use dfort_kernel as kernel;

#[cfg(feature = "server")]
mod error;
#[cfg(feature = "server")]
pub use error::{InitError, InitErrorExt};

#[cfg(feature = "server")]
pub mod server {
    pub mod router {
        pub use dfort_kernel::server::router::{not_found, system_router};
    }
}

/// Feature registry for runtime introspection.
pub mod features {
    #[cfg(feature = "server")]
    pub use dfort_audit as audit;
    #[cfg(feature = "server")]
    pub use dfort_identity as identity;
    #[cfg(feature = "server")]
    pub use dfort_vaults as vaults;

    /// Build-time enabled features (by Cargo feature).
    pub const ENABLED: &[&str] = &[
        #[cfg(feature = "server")]
        "server",
        #[cfg(feature = "server")]
        "identity",
        #[cfg(feature = "server")]
        "audit",
        #[cfg(feature = "server")]
        "vaults",
    ];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

#[cfg(feature = "server")]
use dfort_database::Database;
#[cfg(feature = "server")]
use dfort_domain::config::ApiConfig;
#[cfg(feature = "server")]
use dfort_domain::registry::InitializedSlice;
#[cfg(feature = "server")]
use dfort_kernel::server::ApiState;
#[cfg(feature = "server")]
use dfort_storage::Storage;
#[cfg(feature = "server")]
use utoipa_axum::router::OpenApiRouter;

/// Initialize all enabled features for server mode.
///
/// Must be called from within a Tokio runtime (the audit drain task starts here).
///
/// # Errors
/// Returns an error if any feature initialization fails.
#[cfg(feature = "server")]
pub fn init(
    config: &ApiConfig,
    database: &Database,
    storage: &Storage,
) -> Result<Vec<InitializedSlice>, InitError> {
    let mut slices = Vec::new();

    // Identity: tokens and the guard every protected route extracts
    slices.push(features::identity::init(config, database)?);

    // Audit: started first so the vault boundary can hold its recorder
    let audit = features::audit::start(config, database)?;
    let recorder = audit.recorder.clone();
    slices.push(InitializedSlice::new(audit));

    // Vaults, credentials and documents
    slices.push(features::vaults::init(config, database, storage, recorder)?);

    Ok(slices)
}

/// Every feature route, relative to the `/api` mount point.
#[cfg(feature = "server")]
pub fn router(config: &ApiConfig) -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .nest("/auth", features::identity::router(config))
        .merge(features::vaults::router(config))
        .merge(features::audit::router())
}
