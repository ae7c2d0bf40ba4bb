//! # Logger
//!
//! Installs the process-wide `tracing` subscriber: an `EnvFilter`, a console layer and an
//! optional non-blocking rolling file layer.
//!
//! `RUST_LOG` always wins over the programmatic default level. Nothing in `DataFort` logs key
//! material, tokens, passwords or ciphertext; handlers log ids and outcomes only.
//!
//! ## Example
//!
//! ```rust
//! # use dfort_logger::{Logger, LevelFilter};
//! let _logger = Logger::builder()
//!     .name("datafort")
//!     .console(true)
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use dfort_domain::config::LoggingConfig;
use private::Sealed;
use std::fs;
use std::marker::PhantomData;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_MAX_FILES: usize = 10;
const LOG_FILE_SUFFIX: &str = "log";

#[derive(Debug)]
struct LoggerSettings {
    console: bool,
    path: Option<PathBuf>,
    level: LevelFilter,
    rotation: Rotation,
    max_files: usize,
    json: bool,
    directives: Option<String>,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            console: true,
            path: None,
            level: LevelFilter::INFO,
            rotation: Rotation::DAILY,
            max_files: DEFAULT_MAX_FILES,
            json: false,
            directives: None,
        }
    }
}

#[derive(Debug)]
pub struct NoName;
#[derive(Debug)]
pub struct WithName(String);
#[derive(Debug)]
pub struct NoFile;
#[derive(Debug)]
pub struct WithFile;

mod private {
    pub trait Sealed {}
}
impl Sealed for NoName {}
impl Sealed for WithName {}
impl Sealed for NoFile {}
impl Sealed for WithFile {}

/// Typestate builder for the global subscriber: a name is required before `init`, and file
/// options only exist once a directory is set.
#[derive(Debug)]
pub struct LoggerBuilder<N: Sealed = NoName, F: Sealed = NoFile> {
    settings: LoggerSettings,
    name: N,
    file_state: PhantomData<F>,
}

impl<F: Sealed> LoggerBuilder<NoName, F> {
    /// Names the process; also the rolling file prefix (`<name>.<date>.log`).
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<WithName, F> {
        LoggerBuilder {
            name: WithName(name.into()),
            settings: self.settings,
            file_state: PhantomData,
        }
    }
}

impl LoggerBuilder<WithName, WithFile> {
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.settings.max_files = max;
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn rotation(mut self, rotation: Rotation) -> Self {
        self.settings.rotation = rotation;
        self
    }
}

impl<F: Sealed> LoggerBuilder<WithName, F> {
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.settings.level = level;
        self
    }

    /// Programmatic filter directives (e.g. `dfort_vaults=debug,tower_http=info`).
    ///
    /// `RUST_LOG` still overrides. Invalid directives make [`LoggerBuilder::init`] fail.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn env_filter(mut self, filter: impl Into<String>) -> Self {
        self.settings.directives = Some(filter.into());
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.settings.console = enabled;
        self
    }

    /// Emits JSON lines on every enabled output.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn json(mut self, enabled: bool) -> Self {
        self.settings.json = enabled;
        self
    }

    /// Writes rolling log files into `path`.
    pub fn path(self, path: impl Into<PathBuf>) -> LoggerBuilder<WithName, WithFile> {
        let mut settings = self.settings;
        settings.path = Some(path.into());
        LoggerBuilder { settings, name: self.name, file_state: PhantomData }
    }

    /// Installs the global subscriber.
    ///
    /// The returned [`Logger`] owns the file writer's [`WorkerGuard`]; keep it alive for the
    /// life of the process or buffered lines are lost.
    ///
    /// # Errors
    /// [`LoggerError::Subscriber`] if a global subscriber is already set,
    /// [`LoggerError::InvalidConfiguration`] for an empty name, zero retention, bad directives
    /// or no enabled output.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let LoggerBuilder { settings, name: WithName(name), .. } = self;
        validate(&settings, &name)?;

        let filter = build_env_filter(&settings)?;
        let mut layers = Vec::new();

        if settings.console {
            let console = layer().with_target(true);
            layers.push(if settings.json {
                console.json().boxed()
            } else {
                console.compact().with_ansi(true).boxed()
            });
        }

        let guard = match &settings.path {
            Some(path) => {
                fs::create_dir_all(path).map_err(|e| LoggerError::Internal {
                    message: e.to_string().into(),
                    context: Some(
                        format!("Failed to create log directory: {}", path.display()).into(),
                    ),
                })?;

                let appender = RollingFileAppender::builder()
                    .rotation(settings.rotation.clone())
                    .filename_prefix(&name)
                    .filename_suffix(LOG_FILE_SUFFIX)
                    .max_log_files(settings.max_files)
                    .build(path)?;
                let (writer, guard) = tracing_appender::non_blocking(appender);

                let file = layer().with_writer(writer).with_ansi(false);
                layers.push(if settings.json { file.json().boxed() } else { file.boxed() });
                Some(guard)
            },
            None => None,
        };

        if layers.is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "No logging output enabled; enable the console or set a directory".into(),
                context: None,
            });
        }

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;

        Ok(Logger { guard })
    }
}

/// Handle to the installed logging system. Dropping it flushes and stops the file writer.
#[must_use = "Dropping this handle will stop background logging threads."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { settings: LoggerSettings::default(), name: NoName, file_state: PhantomData }
    }

    /// Installs the subscriber described by the `[logging]` config section.
    ///
    /// `level` accepts either a bare level (`debug`) or full filter directives.
    ///
    /// # Errors
    /// Same as [`LoggerBuilder::init`].
    pub fn from_config(name: &str, config: &LoggingConfig) -> Result<Self, LoggerError> {
        let builder = Self::builder()
            .name(name)
            .console(config.console)
            .json(config.json)
            .env_filter(config.level.clone());

        match &config.directory {
            Some(directory) => builder.path(directory).max_files(config.max_files).init(),
            None => builder.init(),
        }
    }

    /// Whether a file writer is attached.
    #[must_use]
    pub const fn writes_files(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Logging system shutting down, flushing buffers...");
        }
    }
}

fn validate(settings: &LoggerSettings, name: &str) -> Result<(), LoggerError> {
    if name.trim().is_empty() {
        return Err(LoggerError::InvalidConfiguration {
            message: "Logger name cannot be empty".into(),
            context: None,
        });
    }

    if settings.path.is_some() && settings.max_files == 0 {
        return Err(LoggerError::InvalidConfiguration {
            message: "max_files must be greater than zero".into(),
            context: None,
        });
    }

    Ok(())
}

fn build_env_filter(settings: &LoggerSettings) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(settings.level.into());

    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return Ok(builder.from_env_lossy());
    }

    settings.directives.as_ref().map_or_else(
        || Ok(builder.from_env_lossy()),
        |directives| {
            builder.parse(directives).map_err(|e| LoggerError::InvalidConfiguration {
                message: format!("Invalid log filter '{directives}': {e}").into(),
                context: None,
            })
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn builder_defaults() {
        let builder = Logger::builder().name("datafort").env_filter("dfort=debug");
        assert!(builder.settings.console);
        assert!(!builder.settings.json);
        assert_eq!(builder.settings.level, LevelFilter::INFO);
        assert_eq!(builder.settings.directives.as_deref(), Some("dfort=debug"));
        assert!(builder.settings.path.is_none());
    }

    #[test]
    fn file_options_follow_the_path() {
        let tmp = tempdir().unwrap();
        let builder = Logger::builder()
            .name("datafort")
            .path(tmp.path().join("logs"))
            .max_files(3)
            .rotation(Rotation::HOURLY);

        assert_eq!(builder.settings.max_files, 3);
        assert_eq!(builder.settings.rotation, Rotation::HOURLY);
        assert_eq!(builder.settings.path.as_deref(), Some(tmp.path().join("logs").as_path()));
    }

    #[test]
    fn blank_name_is_rejected_before_install() {
        let err = Logger::builder().name("  ").init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn no_output_is_rejected_before_install() {
        let err = Logger::builder().name("datafort").console(false).init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    #[serial]
    fn bad_directives_are_rejected_when_rust_log_is_unset() {
        if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
            return;
        }
        let config = LoggingConfig { level: "dfort=notalevel".into(), ..LoggingConfig::default() };
        let err = Logger::from_config("datafort", &config).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }
}
