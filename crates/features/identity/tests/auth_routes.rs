use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use dfort_database::Database;
use dfort_domain::config::ApiConfig;
use dfort_kernel::server::ApiState;
use dfort_storage::Storage;
use serde_json::{Value, json};
use tower::ServiceExt;

struct Harness {
    app: Router,
    database: Database,
    _dir: tempfile::TempDir,
}

async fn harness() -> Harness {
    let mut config = ApiConfig::default();
    config.rate_limit.enabled = false;

    let dir = tempfile::tempdir().unwrap();
    let database = Database::default();
    let storage = Storage::builder().root(dir.path()).connect().await.unwrap();
    let state = ApiState::builder()
        .config(config.clone())
        .db(database.clone())
        .storage(storage)
        .register_slice(dfort_identity::init(&config, &database).unwrap())
        .build()
        .unwrap();

    let (app, _) = dfort_identity::router(&config).with_state(state).split_for_parts();
    Harness { app, database, _dir: dir }
}

impl Harness {
    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut request =
            Request::builder().method(method).uri(uri).header("content-type", "application/json");
        if let Some(token) = token {
            request = request.header("authorization", format!("Bearer {token}"));
        }
        let request = request.body(Body::from(body.to_string())).unwrap();
        let response = self.app.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn register(&self, email: &str) -> Value {
        let (status, body) =
            self.call("POST", "/register", None, account(email, "password123!")).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

fn account(email: &str, password: &str) -> Value {
    json!({ "email": email, "password": password })
}

#[tokio::test]
async fn register_returns_profile_with_kdf_parameters() {
    let h = harness().await;
    let body = h.register("a@x.com").await;

    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], "a@x.com");
    assert_eq!(body["user"]["kdfSalt"].as_str().unwrap().len(), 64);
    assert_eq!(body["user"]["kdfIterations"], 310_000);
    assert!(body["accessToken"].is_string());
    assert!(body["refreshToken"].is_string());
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let h = harness().await;
    h.register("a@x.com").await;

    let (status, body) =
        h.call("POST", "/register", None, account("A@x.com", "password123!")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "An account with this email already exists.");
}

#[tokio::test]
async fn weak_registration_input_is_rejected() {
    let h = harness().await;

    let (status, _) = h.call("POST", "/register", None, account("nope", "password123!")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = h.call("POST", "/register", None, account("a@x.com", "short")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let h = harness().await;
    h.register("a@x.com").await;

    let (wrong_pw, wrong_pw_body) =
        h.call("POST", "/login", None, account("a@x.com", "password123?")).await;
    let (no_user, no_user_body) =
        h.call("POST", "/login", None, account("b@x.com", "password123!")).await;

    assert_eq!(wrong_pw, StatusCode::UNAUTHORIZED);
    assert_eq!(no_user, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw_body, no_user_body);
    assert_eq!(wrong_pw_body["message"], "Invalid email or password.");

    let (malformed, body) = h.call("POST", "/login", None, json!({ "email": 7 })).await;
    assert_eq!(malformed, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid email or password.");
}

#[tokio::test]
async fn login_then_me() {
    let h = harness().await;
    h.register("a@x.com").await;

    let (status, login) = h.call("POST", "/login", None, account("a@x.com", "password123!")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, me) = h.call("GET", "/me", login["accessToken"].as_str(), Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["id"], login["user"]["id"]);
    assert_eq!(me["user"]["kdfSalt"], login["user"]["kdfSalt"]);
}

#[tokio::test]
async fn guard_messages() {
    let h = harness().await;

    let (status, body) = h.call("GET", "/me", None, Value::Null).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No authorization token provided.");

    let (status, body) = h.call("GET", "/me", Some("garbage"), Value::Null).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token.");
}

#[tokio::test]
async fn deleted_user_tokens_stop_working() {
    let h = harness().await;
    let body = h.register("a@x.com").await;
    let user_id = body["user"]["id"].as_str().unwrap();

    h.database.remove_user(user_id).unwrap();

    let (status, me) = h.call("GET", "/me", body["accessToken"].as_str(), Value::Null).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(me["message"], "User no longer exists.");

    let (status, refreshed) =
        h.call("POST", "/refresh", None, json!({ "token": body["refreshToken"] })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(refreshed["message"], "User not found.");
}

#[tokio::test]
async fn refresh_rotates_without_revoking_the_old_token() {
    let h = harness().await;
    let body = h.register("a@x.com").await;
    let old_refresh = body["refreshToken"].clone();

    let (status, rotated) = h.call("POST", "/refresh", None, json!({ "token": old_refresh })).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(rotated["refreshToken"], old_refresh);

    let (status, _) = h.call("GET", "/me", rotated["accessToken"].as_str(), Value::Null).await;
    assert_eq!(status, StatusCode::OK);

    // No server-side revocation list: the previous refresh token still rotates.
    let (status, _) = h.call("POST", "/refresh", None, json!({ "token": old_refresh })).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn refresh_input_errors() {
    let h = harness().await;
    let body = h.register("a@x.com").await;

    let (status, missing) = h.call("POST", "/refresh", None, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(missing["message"], "Refresh token required.");

    // An access token is not a refresh token.
    let access = json!({ "token": body["accessToken"] });
    let (status, wrong) = h.call("POST", "/refresh", None, access).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong["message"], "Invalid or expired refresh token.");
}

#[tokio::test]
async fn logout_acknowledges() {
    let h = harness().await;
    let body = h.register("a@x.com").await;

    let (status, out) = h.call("POST", "/logout", body["accessToken"].as_str(), Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(out["message"], "Logged out successfully.");
}
