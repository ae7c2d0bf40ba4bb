use dfort_database::DatabaseError;
use dfort_kernel::server::ApiError;
use dfort_storage::StorageError;
use std::borrow::Cow;

/// A specialized [`VaultError`] enum of this crate.
#[dfort_derive::dfort_error]
pub enum VaultError {
    /// Missing, malformed or foreign resource; the three are deliberately indistinguishable.
    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    /// Input that fails shape checks.
    #[error("Vault validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("Record store error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },
    #[error("Blob store error{}: {source}", format_context(.context))]
    Storage { source: StorageError, context: Option<Cow<'static, str>> },
    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal vault error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl VaultError {
    pub fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation { message: message.into(), context: None }
    }
}

impl From<VaultError> for ApiError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::NotFound { message, context } => Self::NotFound { message, context },
            VaultError::Validation { message, context } => Self::Validation { message, context },
            VaultError::Database { source, context } => {
                Self::Internal { message: source.to_string().into(), context }
            },
            VaultError::Storage { source, context } => {
                Self::Internal { message: source.to_string().into(), context }
            },
            VaultError::Internal { message, context } => Self::Internal { message, context },
        }
    }
}
