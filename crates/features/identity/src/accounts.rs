//! Account operations behind the auth routes.

use crate::error::IdentityError;
use crate::passwords::{check_password, hash_password, normalize_email, verify_password};
use crate::tokens::TokenPair;
use crate::IdentityInner;
use chrono::Utc;
use dfort_database::DatabaseError;
use dfort_domain::records::UserRecord;
use dfort_kernel::safe_nanoid;
use tracing::{info, instrument, warn};

pub(crate) const INVALID_LOGIN: &str = "Invalid email or password.";
const DUPLICATE_EMAIL: &str = "An account with this email already exists.";
const KDF_SALT_LEN: usize = 32;

impl IdentityInner {
    /// Creates an account with a fresh KDF salt and signs it in.
    ///
    /// # Errors
    /// [`IdentityError::Validation`] for a malformed email or password,
    /// [`IdentityError::Conflict`] when the email is taken.
    #[instrument(skip_all)]
    pub async fn register(
        &self,
        email: &str,
        password: String,
    ) -> Result<(UserRecord, TokenPair), IdentityError> {
        let email = normalize_email(email).ok_or_else(|| IdentityError::Validation {
            message: "A valid email address is required.".into(),
            context: None,
        })?;
        check_password(&password, &self.password_policy)?;

        if self.database.find_user_by_email(&email).is_some() {
            return Err(IdentityError::Conflict { message: DUPLICATE_EMAIL.into(), context: None });
        }

        let user = UserRecord {
            id: safe_nanoid!(),
            email,
            password_hash: hash_password(password).await?,
            kdf_salt: generate_kdf_salt()?,
            created_at: Utc::now(),
        };

        // A concurrent registration may have won the race while we were hashing.
        self.database.insert_user(user.clone()).map_err(|e| match e {
            DatabaseError::Conflict { .. } => {
                IdentityError::Conflict { message: DUPLICATE_EMAIL.into(), context: None }
            },
            other => IdentityError::Internal {
                message: other.to_string().into(),
                context: Some("Storing user".into()),
            },
        })?;

        let tokens = self.issue(&user.id)?;
        info!(user_id = %user.id, "Account registered");
        Ok((user, tokens))
    }

    /// Checks credentials; every failure looks the same to the caller.
    ///
    /// # Errors
    /// [`IdentityError::Auth`] with a generic message.
    #[instrument(skip_all)]
    pub async fn login(
        &self,
        email: &str,
        password: String,
    ) -> Result<(UserRecord, TokenPair), IdentityError> {
        let user =
            normalize_email(email).and_then(|email| self.database.find_user_by_email(&email));
        let stored = user.as_ref().map(|u| u.password_hash.clone());
        let valid = verify_password(password, stored).await?;

        match user {
            Some(user) if valid => {
                let tokens = self.issue(&user.id)?;
                info!(user_id = %user.id, "Login succeeded");
                Ok((user, tokens))
            },
            _ => {
                warn!("Login rejected");
                Err(IdentityError::Auth { message: INVALID_LOGIN.into(), context: None })
            },
        }
    }

    /// Current profile of a user, if it still exists.
    #[must_use]
    pub fn profile(&self, user_id: &str) -> Option<UserRecord> {
        self.database.find_user(user_id)
    }

    fn issue(&self, user_id: &str) -> Result<TokenPair, IdentityError> {
        self.tokens.issue(user_id).map_err(|e| IdentityError::Internal {
            message: e.to_string().into(),
            context: Some("Issuing tokens".into()),
        })
    }
}

fn generate_kdf_salt() -> Result<String, IdentityError> {
    let mut salt = [0u8; KDF_SALT_LEN];
    getrandom::fill(&mut salt).map_err(|e| IdentityError::Internal {
        message: e.to_string().into(),
        context: Some("Generating KDF salt".into()),
    })?;
    Ok(hex::encode(salt))
}
