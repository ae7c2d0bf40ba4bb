use std::borrow::Cow;

/// A specialized [`StorageError`] enum of this crate.
#[dfort_derive::dfort_error]
pub enum StorageError {
    #[error("Blob not found{}: {message}", format_context(.context))]
    BlobNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid blob or namespace name{}: {message}", format_context(.context))]
    InvalidName { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Path traversal security violation{}: {message}", format_context(.context))]
    PathTraversalAttempt { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Hardware I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },
}
