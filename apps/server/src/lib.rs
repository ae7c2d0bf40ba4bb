//! # DataFort Server
//!
//! HTTP front for the zero-knowledge vault: `Axum` routes over the `DataFort` feature slices, an
//! in-memory record store and a sandboxed blob store for document ciphertext.
//!
//! ## Example
//! ```no_run
//! use dfort_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Server::builder()
//!         .port(5000)
//!         .build()
//!         .await?
//!         .run()
//!         .await
//! }
//! ```

mod router;

use anyhow::{Context, Result};
use axum::Router;
use axum_server::Handle;
use dfort::domain::config::ApiConfig;
use dfort::kernel::server::ApiState;
use dfort_database::Database;
use dfort_storage::Storage;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

/// Time in-flight requests get to finish once shutdown starts.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// A fluent builder for configuring and initializing the [`Server`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    cfg: ApiConfig,
}

impl ServerBuilder {
    /// Set up the server's configuration.
    pub fn config(mut self, cfg: ApiConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.server.port = port;
        self
    }

    fn validate_security_config(&self) -> Result<()> {
        let jwt = &self.cfg.security.jwt;
        if jwt.secret.trim().is_empty() {
            anyhow::bail!("security.jwt.secret must be set (DFORT__SECURITY__JWT__SECRET)");
        }
        if jwt.refresh_secret.as_deref().is_some_and(|s| s.trim().is_empty()) {
            anyhow::bail!("security.jwt.refresh_secret is set but empty");
        }
        Ok(())
    }

    fn validate_ssl_config(&self) -> Result<()> {
        if let Some(ssl) = &self.cfg.server.ssl {
            if !ssl.cert.exists() {
                anyhow::bail!("SSL certificate not found at: {}", ssl.cert.display());
            }
            if !ssl.key.exists() {
                anyhow::bail!("SSL key not found at: {}", ssl.key.display());
            }

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let metadata = ssl.key.metadata()?;
                if metadata.permissions().mode() & 0o077 != 0 {
                    tracing::warn!(
                        "SECURITY: SSL Private Key {} has insecure permissions (should be 600)",
                        ssl.key.display()
                    );
                }
            }
        }
        Ok(())
    }

    /// Opening the store also purges half-written uploads from a previous run.
    async fn init_storage(&self) -> Result<Storage> {
        let root = &self.cfg.storage.data_dir;
        Storage::builder()
            .root(root)
            .connect()
            .await
            .with_context(|| format!("Failed to open blob store at {}", root.display()))
    }

    /// Consumes the builder and initializes the server.
    ///
    /// # Process
    /// 1. Validates the JWT and TLS settings
    /// 2. Opens the blob store and the record store
    /// 3. Initializes the feature slices
    /// 4. Constructs application state
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// Returns an error if:
    /// * the JWT secret is empty
    /// * SSL certificate/key files are missing
    /// * the blob store root cannot be created
    /// * a feature slice rejects its configuration
    pub async fn build(self) -> Result<Server> {
        // 1. Validate configuration
        self.validate_security_config()?;
        self.validate_ssl_config()?;

        let address = SocketAddr::new(self.cfg.server.address, self.cfg.server.port);
        info!(address = %address, "Initializing server");

        // 2. Stores
        let storage = self.init_storage().await?;
        let database = Database::builder().audit_capacity(self.cfg.audit.queue_capacity).build();

        // 3. Orchestrate Feature Slices
        let slices = dfort::init(&self.cfg, &database, &storage)
            .context("Platform bootstrap failed")?;

        // 4. State
        let state = ApiState::builder()
            .config(self.cfg)
            .db(database)
            .storage(storage)
            .register_slices(slices)
            .build()
            .context("Failed to finalize API state registry")?;

        info!(slices = ?state.slice_names().collect::<Vec<_>>(), "Feature slices registered");
        Ok(Server { state })
    }
}

/// A fully initialized server instance ready to run.
#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    state: ApiState,
}

impl Server {
    /// Returns a new [`ServerBuilder`] to configure the server.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// The full application router, as served by [`Server::run`].
    pub fn router(&self) -> Router {
        router::init(self.state.clone())
    }

    /// Starts the server and runs until the shutdown signal is received.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the configured address
    /// or if SSL/TLS setup fails.
    pub async fn run(self) -> Result<()> {
        let cfg = self.state.config.clone();
        let address = SocketAddr::new(cfg.server.address, cfg.server.port);

        info!(address = %address, ssl = cfg.server.ssl.is_some(), "Starting server");

        // Client addresses feed rate limiting and the audit trail.
        let app = self.router().into_make_service_with_connect_info::<SocketAddr>();

        let handle = Handle::<SocketAddr>::new();
        let shutdown_handle = handle.clone();

        tokio::spawn(async move {
            if let Err(e) = shutdown_signal().await {
                error!("Error while waiting for shutdown signal: {e}");
                return;
            }
            info!("Shutdown signal received, starting graceful shutdown...");
            shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        });

        if let Some(ssl_config) = &cfg.server.ssl {
            info!("Starting HTTPS server on https://{address}");

            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                &ssl_config.cert,
                &ssl_config.key,
            )
            .await
            .context("Failed to load SSL/TLS certificates")?;

            axum_server::bind_rustls(address, tls_config)
                .handle(handle)
                .serve(app)
                .await
                .context("HTTPS server failed")?;
        } else {
            info!("Starting HTTP server on http://{address}");

            axum_server::bind(address)
                .handle(handle)
                .serve(app)
                .await
                .context("HTTP server failed")?;
        }

        // Let queued audit entries reach the store before the process exits.
        if let Some(audit) = self.state.get_slice::<dfort::features::audit::Audit>() {
            audit.recorder.flush().await;
        }

        info!("Server shutdown complete");
        Ok(())
    }

    /// Returns a reference to the application state.
    #[must_use]
    pub const fn state(&self) -> &ApiState {
        &self.state
    }
}

/// Listens for shutdown signals (Ctrl+C, SIGTERM).
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => {
            res.context("Ctrl+C signal received")?;
        },
        res = terminate => {
            res.context("SIGTERM signal received")?;
        },
    }

    Ok(())
}
