use std::borrow::Cow;

/// Audit slice error type.
#[dfort_derive::dfort_error]
pub enum AuditError {
    /// The trail store refused the entry.
    #[error("Audit sink error{}: {message}", format_context(.context))]
    Sink { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("Audit error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
