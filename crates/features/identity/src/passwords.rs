//! Account password hashing (Argon2id, PHC strings) and input checks.
//!
//! Hashing is CPU-heavy and runs on the blocking pool so it never stalls the async workers.

use crate::error::IdentityError;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use dfort_domain::config::PasswordPolicy;
use std::sync::LazyLock;
use tokio::task::spawn_blocking;

const MAX_EMAIL_LEN: usize = 254;

/// Verified against when the email is unknown, so both failure paths cost one Argon2 run.
static DECOY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_blocking("decoy-password-for-timing").ok());

/// Lowercases and trims `raw`, returning `None` unless it looks like `local@domain.tld`.
pub(crate) fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return None;
    }

    let (local, domain) = email.split_once('@')?;
    let domain_ok = !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..");

    (!local.is_empty() && domain_ok).then_some(email)
}

pub(crate) fn check_password(password: &str, policy: &PasswordPolicy) -> Result<(), IdentityError> {
    let len = password.chars().count();
    if len < policy.min_length || len > policy.max_length {
        return Err(IdentityError::Validation {
            message: format!(
                "Password must be between {} and {} characters.",
                policy.min_length, policy.max_length
            )
            .into(),
            context: None,
        });
    }
    Ok(())
}

pub(crate) async fn hash_password(password: String) -> Result<String, IdentityError> {
    spawn_blocking(move || hash_blocking(&password)).await.map_err(|e| IdentityError::Internal {
        message: e.to_string().into(),
        context: Some("Password hashing task failed".into()),
    })?
}

/// `hash` of `None` means the account does not exist; the decoy is checked instead and the
/// result is always `false`.
pub(crate) async fn verify_password(
    password: String,
    hash: Option<String>,
) -> Result<bool, IdentityError> {
    spawn_blocking(move || match hash {
        Some(hash) => verify_blocking(&password, &hash),
        None => {
            if let Some(decoy) = DECOY_HASH.as_deref() {
                let _ = verify_blocking(&password, decoy);
            }
            Ok(false)
        },
    })
    .await
    .map_err(|e| IdentityError::Internal {
        message: e.to_string().into(),
        context: Some("Password verification task failed".into()),
    })?
}

fn hash_blocking(password: &str) -> Result<String, IdentityError> {
    let mut salt = [0u8; 16];
    getrandom::fill(&mut salt).map_err(|e| IdentityError::Internal {
        message: e.to_string().into(),
        context: Some("OS RNG unavailable".into()),
    })?;
    let salt = SaltString::encode_b64(&salt).map_err(|e| IdentityError::Internal {
        message: e.to_string().into(),
        context: Some("Encoding password salt".into()),
    })?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::Internal {
            message: e.to_string().into(),
            context: Some("Hashing password".into()),
        })
}

fn verify_blocking(password: &str, hash: &str) -> Result<bool, IdentityError> {
    let parsed = PasswordHash::new(hash).map_err(|e| IdentityError::Internal {
        message: e.to_string().into(),
        context: Some("Stored password hash is malformed".into()),
    })?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert_eq!(normalize_email("  A@X.com "), Some("a@x.com".to_owned()));
        let rejected =
            ["", "a", "a@", "@x.com", "a@x", "a@.com", "a@x.com.", "a b@x.com", "a@b@x.com"];
        for bad in rejected {
            assert_eq!(normalize_email(bad), None, "accepted {bad:?}");
        }
    }

    #[test]
    fn password_length_is_counted_in_characters() {
        let policy = PasswordPolicy::default();
        assert!(check_password("short", &policy).is_err());
        assert!(check_password("password123!", &policy).is_ok());
        assert!(check_password(&"é".repeat(8), &policy).is_ok());
        assert!(check_password(&"x".repeat(129), &policy).is_err());
    }

    #[tokio::test]
    async fn hashes_are_salted_phc_strings() {
        let first = hash_password("password123!".to_owned()).await.unwrap();
        let second = hash_password("password123!".to_owned()).await.unwrap();

        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
        assert!(verify_password("password123!".to_owned(), Some(first.clone())).await.unwrap());
        assert!(!verify_password("password123?".to_owned(), Some(first)).await.unwrap());
        assert!(!verify_password("password123!".to_owned(), None).await.unwrap());
    }
}
