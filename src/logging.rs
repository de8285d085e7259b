//! Logging setup
//!
//! Human-readable or JSON lines on stderr, with an optional daily-rotated
//! log file. `RUST_LOG` directives take precedence over the configured level.

use crate::config::LoggingConfig;
use crate::error::{ClimateError, Result};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

const DEFAULT_LOG_FILE: &str = "climate-relay.log";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level
    pub level: Level,

    /// Log to file
    pub file_path: Option<PathBuf>,

    /// Log to stderr
    pub stderr: bool,

    /// JSON lines instead of text
    pub json: bool,

    /// Include thread IDs
    pub thread_ids: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            file_path: None,
            stderr: true,
            json: false,
            thread_ids: false,
        }
    }
}

impl LogConfig {
    /// Build from the `[logging]` section. `debug` forces the debug level.
    pub fn from_config(config: &LoggingConfig, debug: bool) -> Result<Self> {
        let level = if debug {
            Level::DEBUG
        } else {
            Level::from_str(config.level.trim()).map_err(|_| {
                ClimateError::config(format!("Unknown log level '{}'", config.level))
            })?
        };

        Ok(Self {
            level,
            file_path: config.file.clone(),
            json: config.json,
            ..Self::default()
        })
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn output_layer<W>(writer: W, json: bool, ansi: bool, thread_ids: bool) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    if json {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_thread_ids(thread_ids)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .with_thread_ids(thread_ids)
            .boxed()
    }
}

/// Initialize logging with the given configuration
pub fn init_logging(config: LogConfig) -> Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(config.level.into())
        .from_env_lossy();

    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.stderr {
        layers.push(output_layer(
            std::io::stderr,
            config.json,
            true,
            config.thread_ids,
        ));
    }

    if let Some(file_path) = &config.file_path {
        let directory = file_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| std::path::Path::new("."));
        std::fs::create_dir_all(directory)?;

        let file_name = file_path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new(DEFAULT_LOG_FILE));
        let file_appender = tracing_appender::rolling::daily(directory, file_name);

        layers.push(output_layer(
            file_appender,
            config.json,
            false,
            config.thread_ids,
        ));
    }

    let subscriber = tracing_subscriber::registry().with(layers).with(env_filter);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ClimateError::config(format!("Failed to install logger: {e}")))
}
