use crate::Identity;
use crate::tokens::{AuthenticatedUser, TokenError};
use axum::extract::{FromRef, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use dfort_kernel::server::{ApiError, ApiState};
use std::ops::Deref;

/// Guard for protected routes: yields the verified caller or rejects with 401.
///
/// Every request is checked from scratch: signature, expiry, token kind and that the subject
/// still exists. Nothing about the caller is cached between requests.
#[derive(Debug, Clone)]
pub struct Authenticated(pub AuthenticatedUser);

impl Deref for Authenticated {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Authenticated
where
    ApiState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::auth("No authorization token provided."))?;

        let state = ApiState::from_ref(state);
        let identity = state.try_get_slice::<Identity>()?;

        identity.tokens.verify(token).await.map(Self).map_err(|err| match err {
            TokenError::Expired { .. } => ApiError::auth("Token has expired. Please log in again."),
            err if err.is_subject_gone() => ApiError::auth("User no longer exists."),
            TokenError::Invalid { message, .. } => {
                ApiError::Auth { message: "Invalid token.".into(), context: Some(message) }
            },
            TokenError::Internal { message, context } => ApiError::Internal { message, context },
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
