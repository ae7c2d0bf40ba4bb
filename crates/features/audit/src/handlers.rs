use crate::Audit;
use crate::models::{AuditLogView, AuditPageResponse, AuditQuery, Pagination};
use axum::Json;
use axum::extract::{Query, State};
use dfort_derive::api_handler;
use dfort_domain::config::AuditConfig;
use dfort_domain::constants::AUDIT_TAG;
use dfort_identity::Authenticated;
use dfort_kernel::server::{ApiResult, ApiState};

/// Resolved `(page, limit)`: page at least 1, limit within `1..=max_page_size`, with garbage and
/// zero falling back to the defaults.
pub(crate) fn resolve_page(query: &AuditQuery, config: &AuditConfig) -> (u32, u32) {
    let parse =
        |raw: Option<&String>| raw.and_then(|v| v.trim().parse::<u32>().ok()).filter(|v| *v > 0);

    let page = parse(query.page.as_ref()).unwrap_or(1);
    let limit = parse(query.limit.as_ref())
        .unwrap_or(config.default_page_size)
        .clamp(1, config.max_page_size.max(1));
    (page, limit)
}

#[api_handler(
    get,
    path = "/audit",
    params(AuditQuery),
    responses(
        (
            status = OK,
            description = "The caller's audit trail, newest first",
            body = AuditPageResponse
        ),
        (status = UNAUTHORIZED, description = "Missing or rejected token"),
    ),
    security(("bearer" = [])),
    tag = AUDIT_TAG,
)]
pub(crate) async fn list_audit_logs(
    State(state): State<ApiState>,
    user: Authenticated,
    Query(query): Query<AuditQuery>,
) -> ApiResult<Json<AuditPageResponse>> {
    let audit = state.try_get_slice::<Audit>()?;
    let (page, limit) = resolve_page(&query, &state.config.audit);

    let offset = (page as usize - 1).saturating_mul(limit as usize);
    let (entries, total) = audit.database.audit_page(&user.user_id, offset, limit as usize);

    Ok(Json(AuditPageResponse {
        success: true,
        logs: entries.into_iter().map(AuditLogView::from).collect(),
        pagination: Pagination { total, page, limit, total_pages: total.div_ceil(limit as usize) },
    }))
}
