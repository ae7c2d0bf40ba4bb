use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use chrono::Utc;
use dfort_audit::Audit;
use dfort_database::Database;
use dfort_domain::config::ApiConfig;
use dfort_domain::records::UserRecord;
use dfort_identity::Identity;
use dfort_kernel::server::ApiState;
use dfort_storage::Storage;
use serde_json::{Value, json};
use tower::ServiceExt;

const BOUNDARY: &str = "dfort-test-boundary";

struct Harness {
    app: Router,
    state: ApiState,
    database: Database,
    storage: Storage,
    _dir: tempfile::TempDir,
}

async fn harness_with(config: ApiConfig) -> Harness {
    let database = Database::default();
    for user in ["alice", "bob"] {
        database
            .insert_user(UserRecord {
                id: user.to_owned(),
                email: format!("{user}@x.com"),
                password_hash: String::new(),
                kdf_salt: String::new(),
                created_at: Utc::now(),
            })
            .unwrap();
    }

    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::builder().root(dir.path()).connect().await.unwrap();
    let audit = dfort_audit::start(&config, &database).unwrap();
    let vaults =
        dfort_vaults::init(&config, &database, &storage, audit.recorder.clone()).unwrap();

    let state = ApiState::builder()
        .config(config.clone())
        .db(database.clone())
        .storage(storage.clone())
        .register_slice(dfort_identity::init(&config, &database).unwrap())
        .register_slice(dfort_kernel::domain::registry::InitializedSlice::new(audit))
        .register_slice(vaults)
        .build()
        .unwrap();

    let (app, _) = dfort_vaults::router(&config)
        .merge(dfort_audit::router())
        .with_state(state.clone())
        .split_for_parts();
    Harness { app, state, database, storage, _dir: dir }
}

async fn harness() -> Harness {
    harness_with(ApiConfig::default()).await
}

impl Harness {
    fn token(&self, user_id: &str) -> String {
        let identity = self.state.try_get_slice::<Identity>().unwrap();
        identity.tokens.issue(user_id).unwrap().access_token
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        user: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", self.token(user)))
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        json_of(self.send(request).await).await
    }

    async fn upload(&self, user: &str, parts: &[Part<'_>]) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/documents/upload")
            .header("authorization", format!("Bearer {}", self.token(user)))
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(multipart(parts)))
            .unwrap();
        json_of(self.send(request).await).await
    }

    async fn create_vault(&self, user: &str, name: &str) -> String {
        let (status, body) =
            self.call("POST", "/vaults", user, Some(json!({ "name": name }))).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["vault"]["id"].as_str().unwrap().to_owned()
    }

    async fn create_credential(&self, user: &str, vault_id: &str) -> String {
        let (status, body) =
            self.call("POST", "/credentials", user, Some(sealed_credential(vault_id))).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["credential"]["id"].as_str().unwrap().to_owned()
    }

    /// `(action, resource)` pairs of the user's trail, oldest first.
    async fn trail(&self, user: &str) -> Vec<(String, String)> {
        self.state.try_get_slice::<Audit>().unwrap().recorder.flush().await;
        let (_, body) = self.call("GET", "/audit?limit=100", user, None).await;
        let mut trail: Vec<_> = body["logs"]
            .as_array()
            .unwrap()
            .iter()
            .map(|log| (text(&log["action"]), text(&log["resource"])))
            .collect();
        trail.reverse();
        trail
    }
}

fn text(value: &Value) -> String {
    value.as_str().unwrap().to_owned()
}

async fn json_of(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn sealed_credential(vault_id: &str) -> Value {
    json!({
        "vaultId": vault_id,
        "label": "Mail",
        "url": "https://mail.example.com",
        "encryptedUsername": "abc",
        "encryptedPassword": "def",
        "iv": "00".repeat(12),
        "authTag": "11".repeat(16),
    })
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a [u8]),
}

fn multipart(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            },
            Part::File(file_name, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/pdf\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
                body.extend_from_slice(b"\r\n");
            },
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_parts<'a>(vault_id: &'a str, data: &'a [u8]) -> Vec<Part<'a>> {
    vec![
        Part::Text("vaultId", vault_id),
        Part::Text("iv", "aabbccddeeff00112233aabb"),
        Part::Text("authTag", "00112233445566778899aabbccddeeff"),
        Part::File("tax return.pdf", data),
    ]
}

// --- Vaults ---

#[tokio::test]
async fn vault_crud_with_counts() {
    let h = harness().await;
    let first = h.create_vault("alice", "Personal").await;
    let second = h.create_vault("alice", "Work").await;
    h.create_credential("alice", &first).await;

    let (status, body) = h.call("GET", "/vaults", "alice", None).await;
    assert_eq!(status, StatusCode::OK);
    let vaults = body["vaults"].as_array().unwrap();
    assert_eq!(vaults.len(), 2);
    assert_eq!(vaults[0]["id"], second.as_str());
    assert_eq!(vaults[1]["counts"], json!({ "credentials": 1, "documents": 0 }));

    let rename = json!({ "name": "Home", "color": "#00ff00" });
    let (status, body) = h.call("PUT", &format!("/vaults/{first}"), "alice", Some(rename)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vault"]["name"], "Home");
    assert_eq!(body["vault"]["color"], "#00ff00");

    let (status, body) = h.call("GET", &format!("/vaults/{first}"), "alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vault"]["name"], "Home");
    assert_eq!(body["vault"]["counts"]["credentials"], 1);

    let (status, body) = h.call("DELETE", &format!("/vaults/{second}"), "alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Vault deleted.");

    let (status, body) = h.call("GET", &format!("/vaults/{second}"), "alice", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Vault not found.");
}

#[tokio::test]
async fn vault_fields_are_bounded() {
    let h = harness().await;

    let (status, body) = h.call("POST", "/vaults", "alice", Some(json!({ "name": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let long = "d".repeat(501);
    let (status, _) =
        h.call("POST", "/vaults", "alice", Some(json!({ "name": "x", "description": long }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let too_long = json!({ "name": "x".repeat(101) });
    let (status, _) = h.call("POST", "/vaults", "alice", Some(too_long)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn vault_routes_require_a_token() {
    let h = harness().await;
    let request = Request::builder().uri("/vaults").body(Body::empty()).unwrap();
    let (status, body) = json_of(h.send(request).await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No authorization token provided.");
}

// --- Credentials ---

#[tokio::test]
async fn sealed_credential_round_trips_unchanged() {
    let h = harness().await;
    let vault = h.create_vault("alice", "Personal").await;
    let id = h.create_credential("alice", &vault).await;

    let (status, body) = h.call("GET", &format!("/credentials/vault/{vault}"), "alice", None).await;
    assert_eq!(status, StatusCode::OK);
    let credentials = body["credentials"].as_array().unwrap();
    assert_eq!(credentials.len(), 1);
    let stored = &credentials[0];
    assert_eq!(stored["id"], id.as_str());
    assert_eq!(stored["encryptedUsername"], "abc");
    assert_eq!(stored["encryptedPassword"], "def");
    assert_eq!(stored["iv"], "00".repeat(12));
    assert_eq!(stored["authTag"], "11".repeat(16));
    assert_eq!(stored["encryptedNotes"], Value::Null);

    let (status, body) = h.call("DELETE", &format!("/credentials/{id}"), "alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Credential deleted.");

    let (_, body) = h.call("GET", &format!("/credentials/vault/{vault}"), "alice", None).await;
    assert!(body["credentials"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn credential_input_is_shape_checked() {
    let h = harness().await;
    let vault = h.create_vault("alice", "Personal").await;

    let mut missing_tag = sealed_credential(&vault);
    missing_tag["authTag"] = json!("");
    let (status, _) = h.call("POST", "/credentials", "alice", Some(missing_tag)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut bad_url = sealed_credential(&vault);
    bad_url["url"] = json!("not a url");
    let (status, _) = h.call("POST", "/credentials", "alice", Some(bad_url)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut no_label = sealed_credential(&vault);
    no_label["label"] = json!("");
    let (status, _) = h.call("POST", "/credentials", "alice", Some(no_label)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn credential_updates_reseal_as_a_unit() {
    let h = harness().await;
    let vault = h.create_vault("alice", "Personal").await;
    let id = h.create_credential("alice", &vault).await;
    let uri = format!("/credentials/{id}");

    let partial = json!({ "encryptedPassword": "zzz", "iv": "ab".repeat(12) });
    let (status, body) = h.call("PUT", &uri, "alice", Some(partial)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let relabel = json!({ "label": "Webmail", "url": null });
    let (status, body) = h.call("PUT", &uri, "alice", Some(relabel)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["credential"]["label"], "Webmail");
    assert_eq!(body["credential"]["url"], Value::Null);
    assert_eq!(body["credential"]["encryptedPassword"], "def");
    assert_eq!(body["credential"]["iv"], "00".repeat(12));

    let reseal = json!({
        "encryptedUsername": "u2",
        "encryptedPassword": "p2",
        "encryptedNotes": "n2",
        "iv": "ab".repeat(12),
        "authTag": "cd".repeat(16),
    });
    let (status, body) = h.call("PUT", &uri, "alice", Some(reseal)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["credential"]["encryptedPassword"], "p2");
    assert_eq!(body["credential"]["encryptedNotes"], "n2");
    assert_eq!(body["credential"]["authTag"], "cd".repeat(16));
    assert_eq!(body["credential"]["label"], "Webmail");
}

// --- Ownership ---

#[tokio::test]
async fn other_users_resources_are_indistinguishable_from_missing_ones() {
    let h = harness().await;
    let vault = h.create_vault("alice", "Personal").await;
    let credential = h.create_credential("alice", &vault).await;

    for (method, uri, body, message) in [
        ("GET", format!("/vaults/{vault}"), None, "Vault not found."),
        ("PUT", format!("/vaults/{vault}"), Some(json!({ "name": "Mine" })), "Vault not found."),
        ("DELETE", format!("/vaults/{vault}"), None, "Vault not found."),
        ("GET", format!("/credentials/vault/{vault}"), None, "Vault not found."),
        ("POST", "/credentials".to_owned(), Some(sealed_credential(&vault)), "Vault not found."),
        (
            "PUT",
            format!("/credentials/{credential}"),
            Some(json!({ "label": "x" })),
            "Credential not found.",
        ),
        ("DELETE", format!("/credentials/{credential}"), None, "Credential not found."),
        ("DELETE", "/credentials/NoSuchThing".to_owned(), None, "Credential not found."),
        ("DELETE", "/credentials/..%2Fetc".to_owned(), None, "Credential not found."),
    ] {
        let (status, response) = h.call(method, &uri, "bob", body).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(response["message"], message, "{method} {uri}");
    }

    // Nothing of alice's changed.
    let (_, body) = h.call("GET", &format!("/credentials/vault/{vault}"), "alice", None).await;
    assert_eq!(body["credentials"][0]["label"], "Mail");
    let (_, body) = h.call("GET", &format!("/vaults/{vault}"), "alice", None).await;
    assert_eq!(body["vault"]["name"], "Personal");
}

// --- Documents ---

#[tokio::test]
async fn document_upload_download_and_delete() {
    let h = harness().await;
    let vault = h.create_vault("alice", "Personal").await;
    let ciphertext: Vec<u8> = (0..=255u8).cycle().take(4096).collect();

    let (status, body) = h.upload("alice", &upload_parts(&vault, &ciphertext)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let document = &body["document"];
    assert_eq!(document["fileName"], "tax return.pdf");
    assert_eq!(document["mimeType"], "application/pdf");
    assert_eq!(document["sizeBytes"], 4096);
    let id = document["id"].as_str().unwrap().to_owned();

    let (_, body) = h.call("GET", &format!("/documents/vault/{vault}"), "alice", None).await;
    let listed = &body["documents"][0];
    assert_eq!(listed["id"], id.as_str());
    assert!(listed.get("iv").is_none());
    assert!(listed.get("blobKey").is_none());

    let request = Request::builder()
        .uri(format!("/documents/{id}/download"))
        .header("authorization", format!("Bearer {}", h.token("alice")))
        .body(Body::empty())
        .unwrap();
    let response = h.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["content-type"], "application/octet-stream");
    assert_eq!(headers["x-iv"], "aabbccddeeff00112233aabb");
    assert_eq!(headers["x-authtag"], "00112233445566778899aabbccddeeff");
    let disposition = headers["content-disposition"].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"tax return.pdf\""), "{disposition}");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.as_ref(), ciphertext.as_slice());

    let (status, body) = h.call("DELETE", &format!("/documents/{id}"), "alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Document deleted.");

    let (status, body) = h.call("GET", &format!("/documents/{id}/download"), "alice", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Document not found.");
}

#[tokio::test]
async fn uploads_need_every_field() {
    let h = harness().await;
    let vault = h.create_vault("alice", "Personal").await;

    let mut parts = upload_parts(&vault, b"sealed");
    parts.remove(2);
    let (status, body) = h.upload("alice", &parts).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required fields: vaultId, iv, authTag, file.");

    let parts =
        vec![Part::Text("vaultId", &vault), Part::Text("iv", "00"), Part::Text("authTag", "11")];
    let (status, _) = h.upload("alice", &parts).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_uploads_are_refused() {
    let mut config = ApiConfig::default();
    config.upload.max_bytes = 1024;
    let h = harness_with(config).await;
    let vault = h.create_vault("alice", "Personal").await;

    let (status, _) = h.upload("alice", &upload_parts(&vault, &[7u8; 2048])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = h.call("GET", &format!("/documents/vault/{vault}"), "alice", None).await;
    assert!(body["documents"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn foreign_documents_stay_hidden() {
    let h = harness().await;
    let vault = h.create_vault("alice", "Personal").await;
    let (_, body) = h.upload("alice", &upload_parts(&vault, b"sealed")).await;
    let id = body["document"]["id"].as_str().unwrap().to_owned();

    let (status, body) = h.upload("bob", &upload_parts(&vault, b"intruder")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Vault not found.");

    let routes =
        [("GET", format!("/documents/{id}/download")), ("DELETE", format!("/documents/{id}"))];
    for (method, uri) in routes {
        let (status, body) = h.call(method, &uri, "bob", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Document not found.");
    }
}

#[tokio::test]
async fn deleting_a_vault_removes_children_and_blobs() {
    let h = harness().await;
    let vault = h.create_vault("alice", "Personal").await;
    let credential = h.create_credential("alice", &vault).await;
    let (_, body) = h.upload("alice", &upload_parts(&vault, b"sealed")).await;
    let document = body["document"]["id"].as_str().unwrap().to_owned();
    let blob_key = h.database.find_document(&document).unwrap().blob_key;
    assert!(h.storage.namespace(vault.as_str()).unwrap().exists(&blob_key).unwrap());

    let (status, _) = h.call("DELETE", &format!("/vaults/{vault}"), "alice", None).await;
    assert_eq!(status, StatusCode::OK);

    assert!(h.database.find_credential(&credential).is_none());
    assert!(h.database.find_document(&document).is_none());
    assert!(!h.storage.namespace(vault.as_str()).unwrap().exists(&blob_key).unwrap());
}

// --- Audit ---

#[tokio::test]
async fn every_guarded_call_is_audited_once() {
    let h = harness().await;
    let vault = h.create_vault("alice", "Personal").await;
    let id = h.create_credential("alice", &vault).await;
    h.call("GET", &format!("/credentials/vault/{vault}"), "alice", None).await;
    h.call("PUT", &format!("/credentials/{id}"), "alice", Some(json!({ "label": "" }))).await;
    h.call("POST", "/credentials", "alice", Some(json!({ "bogus": true }))).await;
    h.call("DELETE", &format!("/credentials/{id}"), "alice", None).await;
    let (_, body) = h.upload("alice", &upload_parts(&vault, b"sealed")).await;
    let document = body["document"]["id"].as_str().unwrap().to_owned();
    h.call("GET", &format!("/documents/vault/{vault}"), "alice", None).await;

    // Bob's failed attempts land in bob's trail, not alice's.
    h.call("GET", &format!("/credentials/vault/{vault}"), "bob", None).await;
    h.call("GET", &format!("/documents/{document}/download"), "bob", None).await;
    h.call("DELETE", &format!("/documents/{document}"), "bob", None).await;

    let (status, _) =
        h.call("GET", &format!("/documents/{document}/download"), "alice", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = h.call("DELETE", &format!("/documents/{document}"), "alice", None).await;
    assert_eq!(status, StatusCode::OK);

    let expected = [
        ("CREDENTIAL_CREATE", "credential:new".to_owned()),
        ("CREDENTIAL_LIST", format!("vault:{vault}")),
        ("CREDENTIAL_UPDATE", format!("credential:{id}")),
        ("CREDENTIAL_CREATE", "credential:new".to_owned()),
        ("CREDENTIAL_DELETE", format!("credential:{id}")),
        ("DOCUMENT_UPLOAD", "document:new".to_owned()),
        ("DOCUMENT_LIST", format!("vault:{vault}")),
        ("DOCUMENT_DOWNLOAD", format!("document:{document}")),
        ("DOCUMENT_DELETE", format!("document:{document}")),
    ]
    .map(|(action, resource)| (action.to_owned(), resource));
    assert_eq!(h.trail("alice").await, expected);

    let expected = [
        ("CREDENTIAL_LIST", format!("vault:{vault}")),
        ("DOCUMENT_DOWNLOAD", format!("document:{document}")),
        ("DOCUMENT_DELETE", format!("document:{document}")),
    ]
    .map(|(action, resource)| (action.to_owned(), resource));
    assert_eq!(h.trail("bob").await, expected);
}
