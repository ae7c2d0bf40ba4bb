//! Identity feature slice: accounts, Argon2id password hashing, HS256 bearer tokens and the
//! [`Authenticated`] guard every protected route extracts.
//!
//! The account password only authenticates. Vault keys are derived by the key holder from the
//! master password and the per-user `kdfSalt` this slice hands out; the server never sees them.

mod accounts;
mod error;
mod extractor;
mod handlers;
mod lookup;
pub mod models;
mod passwords;
mod tokens;

pub use crate::error::{IdentityError, IdentityErrorExt};
pub use crate::extractor::Authenticated;
pub use crate::lookup::IdentityLookup;
pub use crate::tokens::{AuthenticatedUser, TokenAuthority, TokenError, TokenKind, TokenPair};

use axum::middleware::from_fn_with_state;
use dfort_database::Database;
use dfort_domain::config::{ApiConfig, PasswordPolicy};
use dfort_kernel::domain::registry::InitializedSlice;
use dfort_kernel::server::{ApiState, RateLimiter, enforce_rate_limit};
use std::sync::Arc;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Identity feature state
#[dfort_derive::feature_slice]
pub struct Identity {
    pub tokens: TokenAuthority,
    database: Database,
    password_policy: PasswordPolicy,
    /// Advertised to key holders next to their salt.
    pub kdf_iterations: u32,
}

/// Initialize the identity feature.
///
/// # Errors
/// [`IdentityError::Config`] when the JWT settings are unusable (e.g. an empty secret).
pub fn init(config: &ApiConfig, database: &Database) -> Result<InitializedSlice, IdentityError> {
    let tokens = TokenAuthority::new(&config.security.jwt, Arc::new(database.clone())).map_err(
        |e| IdentityError::Config {
            message: e.to_string().into(),
            context: Some("security.jwt".into()),
        },
    )?;

    let inner = IdentityInner {
        tokens,
        database: database.clone(),
        password_policy: config.security.password.clone(),
        kdf_iterations: config.security.kdf.iterations,
    };

    tracing::info!(
        access_ttl = config.security.jwt.access_ttl_seconds,
        refresh_ttl = config.security.jwt.refresh_ttl_seconds,
        "Identity slice initialized"
    );
    Ok(InitializedSlice::new(Identity::new(inner)))
}

/// Routes mounted under `/auth`. Register, login and refresh share the tighter auth budget.
pub fn router(config: &ApiConfig) -> OpenApiRouter<ApiState> {
    let mut public = OpenApiRouter::new()
        .routes(routes!(handlers::register))
        .routes(routes!(handlers::login))
        .routes(routes!(handlers::refresh));

    if config.rate_limit.enabled {
        public = public
            .layer(from_fn_with_state(RateLimiter::auth(&config.rate_limit), enforce_rate_limit));
    }

    OpenApiRouter::new()
        .merge(public)
        .routes(routes!(handlers::logout))
        .routes(routes!(handlers::me))
}
