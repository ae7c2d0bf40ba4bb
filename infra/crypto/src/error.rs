//! # Crypto Errors

use std::borrow::Cow;

/// A specialized [`CryptoError`] enum for key-holder failures.
#[dfort_derive::dfort_error]
pub enum CryptoError {
    /// Malformed input: empty password, wrong-length iv/tag/salt, bad hex or base64.
    #[error("Invalid input{}: {message}", format_context(.context))]
    InvalidInput { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The authentication tag did not verify. Deliberately carries no detail.
    #[error("Integrity error{}: {message}", format_context(.context))]
    Integrity { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The operating system RNG could not be read.
    #[error("Entropy source failure{}: {message}", format_context(.context))]
    Entropy { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Reading or writing a byte stream failed.
    #[error("Stream I/O error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Internal crypto error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl CryptoError {
    /// The single message a decrypting party ever sees for a failed tag check.
    pub(crate) fn integrity() -> Self {
        Self::Integrity { message: "decryption failed".into(), context: None }
    }
}
