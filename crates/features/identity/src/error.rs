use dfort_kernel::server::ApiError;
use std::borrow::Cow;

/// A specialized [`IdentityError`] enum of this crate.
#[dfort_derive::dfort_error]
pub enum IdentityError {
    /// Configuration errors for identity/authentication.
    #[error("Identity config error{}: {message}", format_context(.context))]
    Config { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    /// Malformed registration or login input.
    #[error("Identity validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    /// The email is already registered.
    #[error("Identity conflict{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    /// Authentication failures.
    #[error("Identity auth error{}: {message}", format_context(.context))]
    Auth { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal identity error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Validation { message, context } => Self::Validation { message, context },
            IdentityError::Conflict { message, context } => Self::Conflict { message, context },
            IdentityError::Auth { message, context } => Self::Auth { message, context },
            IdentityError::Config { message, context }
            | IdentityError::Internal { message, context } => Self::Internal { message, context },
        }
    }
}
