use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable prefix; nested keys use `__` (e.g. `DFORT__SECURITY__JWT__SECRET`).
pub const ENV_PREFIX: &str = "DFORT";

#[dfort_derive::dfort_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Layered configuration loader: an optional file, then `DFORT__*` environment overrides.
///
/// 1. **Base File**: settings from `path` (any format the `config` crate recognises by extension,
///    e.g. `config.toml`). An explicitly given file must exist; when `path` is `None` the loader
///    looks for `config.*` in the working directory and silently skips it if absent.
/// 2. **Environment Overrides**: variables prefixed with `DFORT__`. Nested structures are addressed
///    with double underscores (`DFORT__SERVER__PORT` maps to `server.port`).
///
/// Every field of the target type should carry a serde default so that an empty environment
/// still yields a usable value.
///
/// # Errors
/// * An explicitly given file cannot be found or parsed.
/// * The merged values do not match the structure of `T`.
///
/// # Example
/// ```rust
/// use dfort_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// let cfg: AppConfig = load_config(Some("config/local")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let required = path.is_some();
    let effective_path = path.map_or_else(|| PathBuf::from("config"), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .convert_case(config::Case::Snake),
        );

    info!(path = %effective_path.display(), required, "Loading configuration");

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
