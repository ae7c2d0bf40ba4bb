//! Bearer token issuing and verification.
//!
//! Tokens are HS256 JWTs. Access and refresh tokens are signed with separate secrets (the refresh
//! secret falls back to the access one) and carry their kind in `typ`, so neither can stand in for
//! the other. Nothing is stored server-side: a token is valid while its signature checks out, it
//! has not expired and its subject still exists.

use crate::lookup::IdentityLookup;
use dfort_domain::config::JwtConfig;
use dfort_kernel::safe_nanoid;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[dfort_derive::dfort_error]
pub enum TokenError {
    /// Signature and claims were fine but `exp` has passed.
    #[error("Token expired{}: {message}", format_context(.context))]
    Expired { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    /// Bad signature, malformed token, wrong kind, wrong issuer or a deleted subject.
    #[error("Token invalid{}: {message}", format_context(.context))]
    Invalid { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("Internal token error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Context marking an [`TokenError::Invalid`] whose signature was fine but whose subject is gone.
const SUBJECT_GONE: &str = "subject no longer exists";

impl TokenError {
    /// A well-formed token for a user that has since been deleted.
    #[must_use]
    pub fn is_subject_gone(&self) -> bool {
        matches!(self, Self::Invalid { context: Some(context), .. } if context == SUBJECT_GONE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: u64,
    exp: u64,
    iss: String,
    typ: TokenKind,
    /// Keeps two pairs minted in the same second distinct.
    jti: String,
}

/// A freshly issued access/refresh pair.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenPair(<redacted>)")
    }
}

/// The identity a verified access token speaks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

struct TokenAuthorityInner {
    access: SigningKeys,
    refresh: SigningKeys,
    issuer: String,
    access_ttl: u64,
    refresh_ttl: u64,
    leeway: u64,
    users: Arc<dyn IdentityLookup>,
}

/// Issues, verifies and rotates bearer tokens.
#[derive(Clone)]
pub struct TokenAuthority {
    inner: Arc<TokenAuthorityInner>,
}

impl fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("issuer", &self.inner.issuer)
            .field("access_ttl", &self.inner.access_ttl)
            .field("refresh_ttl", &self.inner.refresh_ttl)
            .field("users", &self.inner.users)
            .finish_non_exhaustive()
    }
}

impl TokenAuthority {
    /// # Errors
    /// [`TokenError::Internal`] when a signing secret is empty or a TTL is zero.
    pub fn new(config: &JwtConfig, users: Arc<dyn IdentityLookup>) -> Result<Self, TokenError> {
        if config.secret.is_empty() || config.refresh_secret().is_empty() {
            return Err(TokenError::Internal {
                message: "JWT secret must not be empty".into(),
                context: Some("security.jwt".into()),
            });
        }
        if config.access_ttl_seconds == 0 || config.refresh_ttl_seconds == 0 {
            return Err(TokenError::Internal {
                message: "token lifetimes must be positive".into(),
                context: Some("security.jwt".into()),
            });
        }

        Ok(Self {
            inner: Arc::new(TokenAuthorityInner {
                access: SigningKeys::from_secret(&config.secret),
                refresh: SigningKeys::from_secret(config.refresh_secret()),
                issuer: config.issuer.clone(),
                access_ttl: config.access_ttl_seconds,
                refresh_ttl: config.refresh_ttl_seconds,
                leeway: config.clock_skew_seconds,
                users,
            }),
        })
    }

    /// Signs a new pair for `user_id`.
    ///
    /// # Errors
    /// [`TokenError::Internal`] if signing fails.
    pub fn issue(&self, user_id: &str) -> Result<TokenPair, TokenError> {
        self.issue_at(user_id, jsonwebtoken::get_current_timestamp())
    }

    pub(crate) fn issue_at(&self, user_id: &str, now: u64) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.sign(user_id, TokenKind::Access, now)?,
            refresh_token: self.sign(user_id, TokenKind::Refresh, now)?,
        })
    }

    /// Checks an access token and re-confirms that its subject still exists.
    ///
    /// # Errors
    /// [`TokenError::Expired`] or [`TokenError::Invalid`].
    pub async fn verify(&self, token: &str) -> Result<AuthenticatedUser, TokenError> {
        let claims = self.decode(token, TokenKind::Access)?;
        self.confirm_subject(&claims).await?;
        Ok(AuthenticatedUser { user_id: claims.sub })
    }

    /// Exchanges a refresh token for a brand new pair. The presented token is not consumed.
    ///
    /// # Errors
    /// As [`Self::verify`], applied to a refresh-kind token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, TokenError> {
        let claims = self.decode(refresh_token, TokenKind::Refresh)?;
        self.confirm_subject(&claims).await?;
        debug!(user_id = %claims.sub, "Refreshing token pair");
        self.issue(&claims.sub)
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.inner.access,
            TokenKind::Refresh => &self.inner.refresh,
        }
    }

    fn sign(&self, user_id: &str, kind: TokenKind, now: u64) -> Result<String, TokenError> {
        let ttl = match kind {
            TokenKind::Access => self.inner.access_ttl,
            TokenKind::Refresh => self.inner.refresh_ttl,
        };
        let claims = Claims {
            sub: user_id.to_owned(),
            iat: now,
            exp: now.saturating_add(ttl),
            iss: self.inner.issuer.clone(),
            typ: kind,
            jti: safe_nanoid!(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.keys(kind).encoding)
            .map_err(|e| TokenError::Internal {
                message: e.to_string().into(),
                context: Some("Failed to sign token".into()),
            })
    }

    fn decode(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.inner.leeway;
        validation.validate_aud = false;
        validation.set_issuer(&[&self.inner.issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "sub", "iss"]);

        let claims = jsonwebtoken::decode::<Claims>(token, &self.keys(kind).decoding, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    TokenError::Expired { message: "token has expired".into(), context: None }
                },
                _ => TokenError::Invalid { message: e.to_string().into(), context: None },
            })?
            .claims;

        if claims.typ != kind {
            return Err(TokenError::Invalid {
                message: "unexpected token kind".into(),
                context: Some(format!("{:?}", claims.typ).into()),
            });
        }
        Ok(claims)
    }

    async fn confirm_subject(&self, claims: &Claims) -> Result<(), TokenError> {
        if self.inner.users.user_exists(&claims.sub).await {
            Ok(())
        } else {
            debug!(subject = %claims.sub, "Rejecting token for a deleted subject");
            Err(TokenError::Invalid {
                message: "unknown subject".into(),
                context: Some(SUBJECT_GONE.into()),
            })
        }
    }
}
