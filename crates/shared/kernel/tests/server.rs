use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::routing::post;
use dfort_database::Database;
use dfort_kernel::domain::config::ApiConfig;
use dfort_kernel::server::router::{not_found, system_router};
use dfort_kernel::server::*;
use dfort_storage::Storage;
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn app() -> Router {
    let (system, _) = system_router::<()>().split_for_parts();
    system.fallback(not_found)
}

#[tokio::test]
async fn health_reports_service_identity() {
    let response =
        app().oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["cache-control"], "no-store, no-cache, must-revalidate");
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "DataFort API");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn unknown_routes_get_the_error_envelope() {
    let response =
        app().oneshot(Request::get("/api/nowhere").body(Body::empty()).unwrap()).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body, serde_json::json!({ "success": false, "message": "Route not found" }));
}

#[derive(serde::Deserialize)]
struct Echo {
    value: u32,
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = Router::new()
        .route("/echo", post(|ApiJson(echo): ApiJson<Echo>| async move { echo.value.to_string() }));

    let ok = app
        .clone()
        .oneshot(
            Request::post("/echo")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"value":7}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);

    let broken = app
        .oneshot(
            Request::post("/echo")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(broken.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(broken).await["success"], false);
}

#[tokio::test]
async fn rate_limit_middleware_rejects_over_budget() {
    let limiter = RateLimiter::new(1, Duration::from_secs(60), "Too many requests.");
    let app = app().layer(from_fn_with_state(limiter, enforce_rate_limit));

    let first =
        app.clone().oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json_body(second).await["message"], "Too many requests.");
}

#[tokio::test]
async fn state_builder_requires_every_dependency() {
    let err = ApiState::builder().config(ApiConfig::default()).build().unwrap_err();
    assert!(matches!(err, ApiStateError::Validation { .. }));

    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::builder().root(dir.path()).connect().await.unwrap();
    let state = ApiState::builder()
        .config(ApiConfig::default())
        .db(Database::default())
        .storage(storage)
        .build()
        .unwrap();

    assert_eq!(state.slice_names().count(), 0);
    assert_eq!(state.config.server.port, 5000);
}
