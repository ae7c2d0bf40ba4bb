//! Shared string constants: `OpenAPI` tags, custom headers and service identity.

pub const SERVICE_NAME: &str = "DataFort API";

// OpenAPI tags
pub const SYSTEM_TAG: &str = "System";
pub const AUTH_TAG: &str = "Auth";
pub const VAULTS_TAG: &str = "Vaults";
pub const CREDENTIALS_TAG: &str = "Credentials";
pub const DOCUMENTS_TAG: &str = "Documents";
pub const AUDIT_TAG: &str = "Audit";

/// Security scheme name registered in the `OpenAPI` document.
pub const BEARER_SCHEME: &str = "bearer";

// Integrity metadata returned next to a document's ciphertext.
pub const HEADER_IV: &str = "x-iv";
pub const HEADER_AUTH_TAG: &str = "x-authtag";

/// Placeholder id used in resource references for not-yet-created resources.
pub const NEW_RESOURCE: &str = "new";
