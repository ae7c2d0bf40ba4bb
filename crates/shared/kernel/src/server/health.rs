use axum::http::header;
use axum::{Json, response::IntoResponse};
use chrono::{DateTime, Utc};
use dfort_derive::{api_handler, api_model};
use dfort_domain::constants::{SERVICE_NAME, SYSTEM_TAG};

#[api_model]
/// Health check response
pub(super) struct HealthResponse {
    /// Always `ok` while the process serves requests
    status: &'static str,
    /// Service name
    service: &'static str,
    /// Server time
    timestamp: DateTime<Utc>,
}

#[api_handler(
    get,
    path = "/health",
    responses((status = OK, description = "Healthcheck endpoint", body = HealthResponse)),
    tag = SYSTEM_TAG,
)]
pub(super) async fn health_handler() -> impl IntoResponse {
    let body = HealthResponse { status: "ok", service: SERVICE_NAME, timestamp: Utc::now() };

    (
        [
            (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(body),
    )
}
