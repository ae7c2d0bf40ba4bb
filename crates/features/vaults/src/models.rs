use chrono::{DateTime, Utc};
use dfort_derive::api_model;
use dfort_domain::records::{CredentialRecord, DocumentRecord, VaultCounts, VaultRecord};
use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field from an explicit `null` in partial updates.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// --- Vaults ---

#[api_model]
pub struct CreateVaultRequest {
    /// 1 to 100 characters
    #[schema(example = "Personal")]
    pub name: String,
    /// Up to 500 characters
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Partial vault update; absent fields are left alone.
#[api_model]
pub struct UpdateVaultRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[api_model]
#[derive(Clone, Copy)]
pub struct VaultCountsView {
    pub credentials: usize,
    pub documents: usize,
}

impl From<VaultCounts> for VaultCountsView {
    fn from(counts: VaultCounts) -> Self {
        Self { credentials: counts.credentials, documents: counts.documents }
    }
}

#[api_model]
pub struct VaultView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present on reads, omitted right after create and update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<VaultCountsView>,
}

impl VaultView {
    #[must_use]
    pub fn new(vault: VaultRecord, counts: Option<VaultCounts>) -> Self {
        Self {
            id: vault.id,
            name: vault.name,
            description: vault.description,
            icon: vault.icon,
            color: vault.color,
            created_at: vault.created_at,
            updated_at: vault.updated_at,
            counts: counts.map(VaultCountsView::from),
        }
    }
}

#[api_model]
pub struct VaultListResponse {
    pub success: bool,
    pub vaults: Vec<VaultView>,
}

#[api_model]
pub struct VaultResponse {
    pub success: bool,
    pub vault: VaultView,
}

// --- Credentials ---

/// A credential sealed by the key holder. The server checks shapes only.
#[api_model]
pub struct CreateCredentialRequest {
    pub vault_id: String,
    /// 1 to 200 characters, stored in the clear
    #[schema(example = "Mail")]
    pub label: String,
    #[serde(default)]
    #[schema(example = "https://mail.example.com")]
    pub url: Option<String>,
    pub encrypted_username: String,
    pub encrypted_password: String,
    #[serde(default)]
    pub encrypted_notes: Option<String>,
    /// Hex iv the fields were sealed with
    pub iv: String,
    /// Hex GCM tag over the sealed fields
    pub auth_tag: String,
}

/// Partial credential update.
///
/// `label` and `url` change on their own (`url: null` clears it). Any ciphertext change must
/// resend the whole sealed set: both encrypted fields plus a fresh `iv` and `authTag`.
#[api_model]
pub struct UpdateCredentialRequest {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub url: Option<Option<String>>,
    #[serde(default)]
    pub encrypted_username: Option<String>,
    #[serde(default)]
    pub encrypted_password: Option<String>,
    #[serde(default)]
    pub encrypted_notes: Option<String>,
    #[serde(default)]
    pub iv: Option<String>,
    #[serde(default)]
    pub auth_tag: Option<String>,
}

#[api_model]
pub struct CredentialView {
    pub id: String,
    pub vault_id: String,
    pub label: String,
    pub url: Option<String>,
    pub encrypted_username: String,
    pub encrypted_password: String,
    pub encrypted_notes: Option<String>,
    pub iv: String,
    pub auth_tag: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CredentialRecord> for CredentialView {
    fn from(record: CredentialRecord) -> Self {
        Self {
            id: record.id,
            vault_id: record.vault_id,
            label: record.label,
            url: record.url,
            encrypted_username: record.cipher.encrypted_username,
            encrypted_password: record.cipher.encrypted_password,
            encrypted_notes: record.cipher.encrypted_notes,
            iv: record.cipher.iv,
            auth_tag: record.cipher.auth_tag,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[api_model]
pub struct CredentialListResponse {
    pub success: bool,
    pub credentials: Vec<CredentialView>,
}

#[api_model]
pub struct CredentialResponse {
    pub success: bool,
    pub credential: CredentialView,
}

// --- Documents ---

/// Multipart body of `POST /documents/upload`.
#[api_model]
pub struct UploadDocumentForm {
    pub vault_id: String,
    pub iv: String,
    pub auth_tag: String,
    /// The encrypted file; its part name and content type are kept as metadata
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Listing entry; never carries the blob.
#[api_model]
pub struct DocumentSummary {
    pub id: String,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

impl From<DocumentRecord> for DocumentSummary {
    fn from(record: DocumentRecord) -> Self {
        Self {
            id: record.id,
            file_name: record.file_name,
            mime_type: record.mime_type,
            size_bytes: record.size_bytes,
            created_at: record.created_at,
        }
    }
}

#[api_model]
pub struct DocumentView {
    pub id: String,
    pub vault_id: String,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub iv: String,
    pub auth_tag: String,
    pub created_at: DateTime<Utc>,
}

impl From<DocumentRecord> for DocumentView {
    fn from(record: DocumentRecord) -> Self {
        Self {
            id: record.id,
            vault_id: record.vault_id,
            file_name: record.file_name,
            mime_type: record.mime_type,
            size_bytes: record.size_bytes,
            iv: record.iv,
            auth_tag: record.auth_tag,
            created_at: record.created_at,
        }
    }
}

#[api_model]
pub struct DocumentListResponse {
    pub success: bool,
    pub documents: Vec<DocumentSummary>,
}

#[api_model]
pub struct DocumentResponse {
    pub success: bool,
    pub document: DocumentView,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn credential_update_tells_null_from_absent() {
        let clear: UpdateCredentialRequest =
            serde_json::from_value(json!({ "url": null })).unwrap();
        assert_eq!(clear.url, Some(None));

        let keep: UpdateCredentialRequest =
            serde_json::from_value(json!({ "label": "x" })).unwrap();
        assert_eq!(keep.url, None);
    }

    #[test]
    fn requests_reject_unknown_fields() {
        let moved = serde_json::from_value::<UpdateCredentialRequest>(json!({ "vaultId": "v2" }));
        assert!(moved.is_err());
    }
}
