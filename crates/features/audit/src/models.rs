use chrono::{DateTime, Utc};
use dfort_derive::api_model;
use dfort_domain::audit::{AuditAction, AuditEntry};
use serde::Deserialize;
use utoipa::IntoParams;

/// Raw pagination query. Unparseable values fall back to the defaults instead of failing.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditQuery {
    /// 1-based page number
    pub page: Option<String>,
    /// Entries per page (1 to 100)
    pub limit: Option<String>,
}

#[api_model]
pub struct AuditLogView {
    pub id: String,
    #[schema(value_type = String, example = "CREDENTIAL_CREATE")]
    pub action: AuditAction,
    /// `kind:id`, e.g. `vault:Ab3x` or `credential:new`
    pub resource: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<AuditEntry> for AuditLogView {
    fn from(entry: AuditEntry) -> Self {
        Self {
            id: entry.id,
            action: entry.action,
            resource: entry.resource,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            timestamp: entry.timestamp,
        }
    }
}

#[api_model]
pub struct Pagination {
    pub total: usize,
    pub page: u32,
    pub limit: u32,
    pub total_pages: usize,
}

#[api_model]
pub struct AuditPageResponse {
    pub success: bool,
    pub logs: Vec<AuditLogView>,
    pub pagination: Pagination,
}
