//! Diagnostic logging
//!
//! Logs go to stderr through `tracing-subscriber` so stdout only carries test
//! output. The level follows the CLI flags (`--debug`, `--verbose`) and can be
//! overridden with an `NST_LOG` filter directive such as
//! `NST_LOG=network_speed_tester=trace`.

use crate::error::{AppError, Result};
use crate::models::Config;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive that overrides the flags
pub const LOG_FILTER_ENV: &str = "NST_LOG";

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Level implied by the verbosity flags
    pub fn from_flags(verbose: bool, debug: bool) -> Self {
        if debug {
            LogLevel::Debug
        } else if verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    pub fn as_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(AppError::parse(format!("Invalid log level: {}", other))),
        }
    }
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-field lines
    Console,
    /// Compact single-line format
    Compact,
    /// One JSON object per event
    Json,
}

/// Resolved logging settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingOptions {
    pub level: LogLevel,
    pub format: LogFormat,
    pub use_color: bool,
    /// Filter directive that replaces `level` when set
    pub directive: Option<String>,
}

impl LoggingOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            level: LogLevel::from_flags(config.verbose, config.debug),
            format: if config.debug { LogFormat::Json } else { LogFormat::Console },
            use_color: config.enable_color,
            directive: std::env::var(LOG_FILTER_ENV).ok().filter(|d| !d.trim().is_empty()),
        }
    }

    /// Build the filter for these options
    pub fn env_filter(&self) -> Result<EnvFilter> {
        match &self.directive {
            Some(directive) => EnvFilter::try_new(directive)
                .map_err(|e| AppError::config(format!("Invalid {} directive '{}': {}", LOG_FILTER_ENV, directive, e))),
            None => Ok(EnvFilter::default().add_directive(self.level.as_filter().into())),
        }
    }
}

/// Install the global subscriber
///
/// Returns `Ok(false)` when a subscriber was already installed.
pub fn init_logging(config: &Config) -> Result<bool> {
    init_with(&LoggingOptions::from_config(config))
}

pub fn init_with(options: &LoggingOptions) -> Result<bool> {
    let filter = options.env_filter()?;
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(false);
    }

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match options.format {
        LogFormat::Console => builder.with_ansi(options.use_color).try_init(),
        LogFormat::Compact => builder.compact().with_ansi(options.use_color).try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    };

    Ok(installed.is_ok())
}
