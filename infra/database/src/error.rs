use std::borrow::Cow;

/// A specialized [`DatabaseError`] enum of this crate.
#[dfort_derive::dfort_error]
pub enum DatabaseError {
    /// A uniqueness constraint rejected the write.
    #[error("Conflict{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The addressed record does not exist.
    #[error("Record not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal database error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
