//! Persisted records. Ownership is strictly hierarchical:
//! [`UserRecord`] owns [`VaultRecord`]s, which own [`CredentialRecord`]s and [`DocumentRecord`]s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    /// Argon2 PHC string; never leaves the server.
    pub password_hash: String,
    /// Hex-encoded 256-bit salt the key holder derives its master key with.
    pub kdf_salt: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRecord {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ciphertext plus the integrity metadata needed to open it.
///
/// The three parts are only ever replaced together; a stale iv next to fresh ciphertext
/// would fail authentication on the key holder's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherFields {
    pub encrypted_username: String,
    pub encrypted_password: String,
    pub encrypted_notes: Option<String>,
    pub iv: String,
    pub auth_tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: String,
    pub vault_id: String,
    pub label: String,
    pub url: Option<String>,
    pub cipher: CipherFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub vault_id: String,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    /// Name of the opaque blob in the document store.
    pub blob_key: String,
    pub iv: String,
    pub auth_tag: String,
    pub created_at: DateTime<Utc>,
}

/// Child counts shown next to a vault.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultCounts {
    pub credentials: usize,
    pub documents: usize,
}
