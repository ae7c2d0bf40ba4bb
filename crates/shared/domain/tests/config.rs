use dfort_domain::config::{ApiConfig, JwtConfig, RateLimitConfig, ServerConfig};
use serde_json::json;

#[test]
fn config_defaults_are_sane() {
    let server = ServerConfig::default();
    assert_eq!(server.port, 5000);
    assert!(server.ssl.is_none());
    assert_eq!(server.cors_origins, vec!["http://localhost:5173".to_owned()]);

    let jwt = JwtConfig::default();
    assert_eq!(jwt.access_ttl_seconds, 604_800);
    assert_eq!(jwt.refresh_ttl_seconds, 2_592_000);
    assert_eq!(jwt.refresh_secret(), jwt.secret);

    let limits = RateLimitConfig::default();
    assert!(limits.auth_max_requests < limits.max_requests);

    let cfg = ApiConfig::default();
    assert!(cfg.security.kdf.iterations >= 300_000);
    assert_eq!(cfg.upload.max_bytes, 50 * 1024 * 1024);
}

#[test]
fn api_config_deserializes() {
    let raw = json!({
        "server": { "address": "::", "port": 8080 },
        "security": { "jwt": { "secret": "s1", "refresh_secret": "s2" } },
        "storage": { "data_dir": "/tmp/blobs" },
        "audit": { "max_page_size": 50 }
    });

    let cfg: ApiConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.security.jwt.refresh_secret(), "s2");
    assert_eq!(cfg.security.jwt.issuer, "datafort");
    assert_eq!(cfg.storage.data_dir, std::path::PathBuf::from("/tmp/blobs"));
    assert_eq!(cfg.audit.max_page_size, 50);
    assert_eq!(cfg.audit.default_page_size, 20);
}

#[test]
fn config_clone_on_write_keeps_original() {
    let original = ApiConfig::default();
    let mut tuned = original.clone();
    tuned.rate_limit.enabled = false;

    assert!(original.rate_limit.enabled);
    assert!(!tuned.rate_limit.enabled);
}
