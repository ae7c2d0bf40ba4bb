use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level API configuration shared across services.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfigInner {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    pub audit: AuditConfig,
    pub logging: LoggingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(flatten, default)]
    inner: Arc<ApiConfigInner>,
}

impl Deref for ApiConfig {
    type Target = ApiConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ApiConfig {
    fn deref_mut(&mut self) -> &mut ApiConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub ssl: Option<SslConfig>,
    /// Browser origins allowed to call the API with credentials.
    pub cors_origins: Vec<String>,
    /// Upper bound for JSON request bodies.
    pub json_limit_bytes: usize,
}

/// TLS certificate/key paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub jwt: JwtConfig,
    pub kdf: KdfConfig,
    pub password: PasswordPolicy,
}

/// Session token settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,
    /// Separate signing secret for refresh tokens; falls back to `secret` when unset.
    pub refresh_secret: Option<String>,
    pub issuer: String,
    pub access_ttl_seconds: u64,
    pub refresh_ttl_seconds: u64,
    pub clock_skew_seconds: u64,
}

impl JwtConfig {
    #[must_use]
    pub fn refresh_secret(&self) -> &str {
        self.refresh_secret.as_deref().unwrap_or(&self.secret)
    }
}

/// Master-key derivation parameters handed to key holders.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KdfConfig {
    pub iterations: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

/// Per-client request throttling.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub window_seconds: u64,
    /// Budget for every route in one window.
    pub max_requests: u32,
    /// Tighter budget for the credential-accepting auth routes.
    pub auth_max_requests: u32,
}

/// Root of the opaque document blob store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub queue_capacity: usize,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub console: bool,
    pub json: bool,
    /// Rolling log files are written here when set.
    pub directory: Option<PathBuf>,
    pub max_files: usize,
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            ssl: None,
            cors_origins: vec!["http://localhost:5173".to_owned()],
            json_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        Self { cert: PathBuf::from("cert.pem"), key: PathBuf::from("key.pem") }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "dev-only-change-me".to_owned(),
            refresh_secret: None,
            issuer: "datafort".to_owned(),
            access_ttl_seconds: 7 * 24 * 3600,
            refresh_ttl_seconds: 30 * 24 * 3600,
            clock_skew_seconds: 30,
        }
    }
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self { iterations: 310_000 }
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self { min_length: 8, max_length: 128 }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { enabled: true, window_seconds: 15 * 60, max_requests: 100, auth_max_requests: 10 }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: PathBuf::from("data/blobs") }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self { max_bytes: 50 * 1024 * 1024 }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { queue_capacity: 1024, default_page_size: 20, max_page_size: 100 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            console: true,
            json: false,
            directory: None,
            max_files: 10,
        }
    }
}
