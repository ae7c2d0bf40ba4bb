use chrono::{DateTime, Utc};
use dfort_derive::api_model;
use dfort_domain::records::UserRecord;

#[api_model]
pub struct RegisterRequest {
    /// Account email; compared case-insensitively
    #[schema(example = "a@x.com")]
    pub email: String,
    /// Account password (8 to 128 characters). Never used as the vault key.
    #[schema(example = "password123!")]
    pub password: String,
}

#[api_model]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[api_model]
pub struct RefreshRequest {
    /// A refresh token from a previous login or refresh
    #[serde(default)]
    pub token: Option<String>,
}

/// Public account profile. `kdfSalt` and `kdfIterations` let a key holder re-derive the vault
/// key on any device; neither is secret.
#[api_model]
#[derive(Clone)]
pub struct UserPayload {
    pub id: String,
    pub email: String,
    /// Hex-encoded 256-bit PBKDF2 salt
    pub kdf_salt: String,
    pub kdf_iterations: u32,
    pub created_at: DateTime<Utc>,
}

impl UserPayload {
    #[must_use]
    pub fn from_record(user: &UserRecord, kdf_iterations: u32) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            kdf_salt: user.kdf_salt.clone(),
            kdf_iterations,
            created_at: user.created_at,
        }
    }
}

#[api_model]
pub struct AuthResponse {
    pub success: bool,
    pub user: UserPayload,
    pub access_token: String,
    pub refresh_token: String,
}

#[api_model]
pub struct TokenResponse {
    pub success: bool,
    pub access_token: String,
    pub refresh_token: String,
}

#[api_model]
pub struct ProfileResponse {
    pub success: bool,
    pub user: UserPayload,
}

#[api_model]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}
