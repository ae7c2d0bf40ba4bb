use super::ApiStateError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::borrow::Cow;
use tracing::{error, warn};

/// Response body for internal failures; the real cause only goes to the log.
pub const INTERNAL_MESSAGE: &str = "An unexpected error occurred.";

/// Every failure a handler can surface. Each variant maps to exactly one status code and the
/// `message` is shown to the client verbatim; `context` is for logs only.
#[dfort_derive::dfort_error]
pub enum ApiError {
    #[error("Validation failed{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("Authentication failed{}: {message}", format_context(.context))]
    Auth { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("Conflict{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("Rate limited{}: {message}", format_context(.context))]
    RateLimited { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation { message: message.into(), context: None }
    }

    pub fn auth(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Auth { message: message.into(), context: None }
    }

    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound { message: message.into(), context: None }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Auth { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The client-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Internal { .. } => INTERNAL_MESSAGE,
            Self::Validation { message, .. }
            | Self::Auth { message, .. }
            | Self::NotFound { message, .. }
            | Self::Conflict { message, .. }
            | Self::RateLimited { message, .. } => message.as_ref(),
        }
    }
}

impl From<ApiStateError> for ApiError {
    fn from(err: ApiStateError) -> Self {
        Self::Internal {
            message: err.to_string().into(),
            context: Some("Application state".into()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal { .. } => error!(error = %self, "Request failed"),
            Self::RateLimited { .. } => warn!(error = %self, "Request throttled"),
            _ => tracing::debug!(kind = self.kind(), error = %self, "Request rejected"),
        }

        (status, Json(ErrorBody { success: false, message: self.message() })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_details_stay_out_of_the_message() {
        let err = ApiError::from("store lock poisoned");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), INTERNAL_MESSAGE);
        assert!(err.to_string().contains("store lock poisoned"));
    }

    #[test]
    fn context_is_not_shown_to_clients() {
        let err: ApiResult<()> = Err(ApiError::not_found("Vault not found."));
        let err = err.context("owner mismatch").unwrap_err();
        assert_eq!(err.message(), "Vault not found.");
        assert_eq!(err.to_string(), "Not found (owner mismatch): Vault not found.");
    }

    #[test]
    fn struct_variants_carry_their_status() {
        let conflict = ApiError::Conflict { message: "Email taken.".into(), context: None };
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
        assert_eq!(conflict.message(), "Email taken.");

        let throttled = ApiError::RateLimited { message: "Slow down.".into(), context: None };
        assert_eq!(throttled.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
