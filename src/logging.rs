//! Logging subsystem
//!
//! Structured logging via tracing with JSON (production) and plaintext
//! (development) output formats.
//!
//! # Log Targets
//!
//! Use these consistent target names across the codebase:
//! - `ratelimit` - retry/backoff decisions
//! - `webhook` - inbound webhook ingestion
//! - `storage` - write-through persistence
//! - `config` - configuration loading
//!
//! # Environment Variables
//!
//! - `OUTPOST_LOG` - Primary log level/filter (takes precedence)
//! - `RUST_LOG` - Fallback log level/filter

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing::Level;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Guard to track if logging has been initialized
static INIT_GUARD: OnceLock<()> = OnceLock::new();

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON format for production (structured logs)
    Json,
    /// Human-readable plaintext for development
    #[default]
    Plaintext,
}

/// Log output destination
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogOutput {
    /// Write to stdout
    #[default]
    Stdout,
    /// Write to stderr
    Stderr,
    /// Write to a file at the given path
    File(PathBuf),
}

/// Configuration for the logging subsystem
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    pub output: LogOutput,
    /// Default log level when no env filter is set
    pub default_level: Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Plaintext,
            output: LogOutput::Stdout,
            default_level: Level::INFO,
        }
    }
}

impl LogConfig {
    /// Development configuration (plaintext to stdout, debug level)
    pub fn development() -> Self {
        Self {
            format: LogFormat::Plaintext,
            output: LogOutput::Stdout,
            default_level: Level::DEBUG,
        }
    }

    /// Production configuration (JSON to stdout, info level)
    pub fn production() -> Self {
        Self {
            format: LogFormat::Json,
            output: LogOutput::Stdout,
            default_level: Level::INFO,
        }
    }
}

/// Error type for logging initialization
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to create log file: {0}")]
    FileCreation(#[from] io::Error),
    #[error("failed to parse log filter: {0}")]
    FilterParse(#[from] tracing_subscriber::filter::ParseError),
    #[error("logging already initialized")]
    AlreadyInitialized,
    #[error("failed to initialize subscriber: {0}")]
    TryInit(#[from] tracing_subscriber::util::TryInitError),
}

/// Build an EnvFilter from environment variables or the default level.
///
/// Checks OUTPOST_LOG first, then RUST_LOG.
fn build_env_filter(default_level: Level) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = std::env::var("OUTPOST_LOG") {
        return Ok(EnvFilter::try_new(filter)?);
    }
    if let Ok(filter) = std::env::var("RUST_LOG") {
        return Ok(EnvFilter::try_new(filter)?);
    }

    let default_filter = format!(
        "{level},ratelimit={level},webhook={level},storage={level},config={level}",
        level = default_level.as_str().to_lowercase()
    );
    Ok(EnvFilter::try_new(default_filter)?)
}

/// Initialize the logging subsystem with the given configuration.
///
/// Call once at application startup; subsequent calls return an error.
pub fn init_logging(config: LogConfig) -> Result<(), LoggingError> {
    if INIT_GUARD.set(()).is_err() {
        return Err(LoggingError::AlreadyInitialized);
    }

    let filter = build_env_filter(config.default_level)?;
    let timer = UtcTime::rfc_3339();

    macro_rules! install {
        ($make_writer:expr) => {
            match config.format {
                LogFormat::Json => {
                    let layer = tracing_subscriber::fmt::layer()
                        .json()
                        .with_timer(timer)
                        .with_target(true)
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_writer($make_writer)
                        .with_filter(filter);
                    tracing_subscriber::registry().with(layer).try_init()?;
                }
                LogFormat::Plaintext => {
                    let layer = tracing_subscriber::fmt::layer()
                        .with_timer(timer)
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_thread_names(false)
                        .with_file(false)
                        .with_line_number(false)
                        .with_writer($make_writer)
                        .with_filter(filter);
                    tracing_subscriber::registry().with(layer).try_init()?;
                }
            }
        };
    }

    match &config.output {
        LogOutput::Stdout => install!(io::stdout),
        LogOutput::Stderr => install!(io::stderr),
        LogOutput::File(path) => {
            let file = std::sync::Mutex::new(File::create(path)?);
            install!(file);
        }
    }

    Ok(())
}

/// Initialize logging for tests.
///
/// Debug-level plaintext to stdout; silently ignores double initialization so
/// it is safe to call from every test.
pub fn init_test_logging() {
    if INIT_GUARD.set(()).is_err() {
        return;
    }
    let Ok(filter) = build_env_filter(Level::DEBUG) else {
        return;
    };
    let layer = tracing_subscriber::fmt::layer()
        .with_timer(UtcTime::rfc_3339())
        .with_target(true)
        .with_filter(filter);
    let _ = tracing_subscriber::registry().with(layer).try_init();
}

/// Log target constants for consistent naming across the codebase
pub mod targets {
    /// Retry/backoff decisions
    pub const RATELIMIT: &str = "ratelimit";
    /// Inbound webhook ingestion
    pub const WEBHOOK: &str = "webhook";
    /// Write-through persistence
    pub const STORAGE: &str = "storage";
    /// Configuration loading
    pub const CONFIG: &str = "config";
}
