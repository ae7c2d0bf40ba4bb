use crate::SAFE_ALPHABET;
use std::borrow::Cow;

#[dfort_derive::dfort_error]
pub enum ResourceGuardError {
    #[error("Resource validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Upper bound for ids accepted from clients; minted ids are [`crate::ID_LEN`] long.
const MAX_ID_LEN: usize = 64;

/// Utilities for safe resource handling and ID validation.
#[derive(Debug)]
pub struct ResourceGuard;

impl ResourceGuard {
    /// Checks that a client-supplied id could have been minted by [`crate::safe_nanoid!`].
    ///
    /// Ids end up in store keys and blob namespace paths, so anything outside the safe alphabet
    /// (separators, dots, whitespace) is rejected before it reaches either.
    ///
    /// # Errors
    /// Returns an error if the id is empty, too long, or contains foreign characters.
    pub fn verify_id<'a>(id: &'a str, kind: &'static str) -> Result<&'a str, ResourceGuardError> {
        if id.is_empty() || id.len() > MAX_ID_LEN {
            return Err(ResourceGuardError::Validation {
                message: format!("{kind} id has invalid length {}", id.len()).into(),
                context: None,
            });
        }

        if let Some(ch) = id.chars().find(|ch| !SAFE_ALPHABET.contains(ch)) {
            return Err(ResourceGuardError::Validation {
                message: format!("{kind} id contains {ch:?}").into(),
                context: Some("Unexpected character".into()),
            });
        }

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_verification() {
        let id = crate::safe_nanoid!();
        assert_eq!(ResourceGuard::verify_id(&id, "vault").unwrap(), id);

        assert!(ResourceGuard::verify_id("", "vault").is_err());
        assert!(ResourceGuard::verify_id("../etc", "vault").is_err());
        // '0' and 'l' are never minted
        assert!(ResourceGuard::verify_id("abc0", "vault").is_err());
        assert!(ResourceGuard::verify_id(&"a".repeat(65), "vault").is_err());
    }
}
