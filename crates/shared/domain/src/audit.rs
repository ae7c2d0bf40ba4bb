//! Audit vocabulary: what happened, to which resource, by whom.

use crate::constants::NEW_RESOURCE;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sensitive operations recorded by the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    CredentialList,
    CredentialCreate,
    CredentialUpdate,
    CredentialDelete,
    DocumentList,
    DocumentUpload,
    DocumentDownload,
    DocumentDelete,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CredentialList => "CREDENTIAL_LIST",
            Self::CredentialCreate => "CREDENTIAL_CREATE",
            Self::CredentialUpdate => "CREDENTIAL_UPDATE",
            Self::CredentialDelete => "CREDENTIAL_DELETE",
            Self::DocumentList => "DOCUMENT_LIST",
            Self::DocumentUpload => "DOCUMENT_UPLOAD",
            Self::DocumentDownload => "DOCUMENT_DOWNLOAD",
            Self::DocumentDelete => "DOCUMENT_DELETE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of resources that live inside a vault's ownership chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Vault,
    Credential,
    Document,
}

impl ResourceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vault => "vault",
            Self::Credential => "credential",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `kind:id` reference stored in audit entries, e.g. `vault:Ab3x` or `credential:new`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    kind: ResourceKind,
    id: Option<String>,
}

impl ResourceRef {
    pub fn existing(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self { kind, id: Some(id.into()) }
    }

    /// Reference for a resource that does not exist yet (creation attempts).
    #[must_use]
    pub const fn pending(kind: ResourceKind) -> Self {
        Self { kind, id: None }
    }

    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id.as_deref().unwrap_or(NEW_RESOURCE))
    }
}

/// Immutable record of one access attempt. Never carries ciphertext or plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub user_id: String,
    pub action: AuditAction,
    pub resource: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_refs_render_as_kind_and_id() {
        assert_eq!(ResourceRef::existing(ResourceKind::Vault, "v1").to_string(), "vault:v1");
        assert_eq!(ResourceRef::pending(ResourceKind::Credential).to_string(), "credential:new");
        assert_eq!(ResourceRef::pending(ResourceKind::Document).id(), None);
    }

    #[test]
    fn actions_serialize_in_screaming_snake_case() {
        let raw = serde_json::to_string(&AuditAction::DocumentDownload).unwrap();
        assert_eq!(raw, "\"DOCUMENT_DOWNLOAD\"");
        assert_eq!(AuditAction::CredentialList.to_string(), "CREDENTIAL_LIST");
    }
}
