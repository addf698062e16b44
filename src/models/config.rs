//! Configuration data model and validation

use crate::registry::ServerRegistry;
use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest accepted upload payload
pub const MAX_UPLOAD_PAYLOAD_BYTES: u64 = 256 * 1024 * 1024;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Server identifier to test against (`auto` for the default server)
    #[serde(default = "default_server")]
    pub server: String,

    /// Server that `auto` resolves to
    #[serde(default = "default_default_server")]
    pub default_server: String,

    /// Timeout for a single latency probe in milliseconds
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Timeout for a whole download or upload in seconds
    #[serde(default = "default_transfer_timeout_secs")]
    pub transfer_timeout_seconds: u64,

    /// Size of the upload payload in bytes
    #[serde(default = "default_upload_payload_bytes")]
    pub upload_payload_bytes: u64,

    /// Number of history entries to display
    #[serde(default = "default_history_display")]
    pub history_display: usize,

    /// Number of consecutive runs to perform
    #[serde(default = "default_runs")]
    pub runs: u32,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,

    /// Print results as JSON instead of tables
    #[serde(default)]
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: default_server(),
            default_server: default_default_server(),
            probe_timeout_ms: default_probe_timeout_ms(),
            transfer_timeout_seconds: default_transfer_timeout_secs(),
            upload_payload_bytes: default_upload_payload_bytes(),
            history_display: default_history_display(),
            runs: default_runs(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
            json: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get probe timeout as Duration
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Get transfer timeout as Duration
    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_seconds)
    }

    /// Validate the configuration and return the first problem found
    pub fn validate(&self) -> Result<()> {
        let registry = ServerRegistry::builtin();

        if self.server.trim().is_empty() {
            return Err(AppError::config("Server identifier cannot be empty"));
        }

        if !registry.is_known(&self.server) {
            return Err(AppError::config(format!(
                "Unknown server '{}'; expected one of: {}",
                self.server,
                registry.identifiers().join(", ")
            )));
        }

        if !registry.is_concrete(&self.default_server) {
            return Err(AppError::config(format!(
                "Default server must be a concrete server, got '{}'",
                self.default_server
            )));
        }

        if self.probe_timeout_ms < 100 {
            return Err(AppError::config("Probe timeout must be at least 100ms"));
        }

        if self.probe_timeout_ms > 60_000 {
            return Err(AppError::config("Probe timeout cannot exceed 60000ms"));
        }

        if self.transfer_timeout_seconds == 0 {
            return Err(AppError::config("Transfer timeout must be greater than 0"));
        }

        if self.transfer_timeout_seconds > 600 {
            return Err(AppError::config("Transfer timeout cannot exceed 600 seconds"));
        }

        if self.upload_payload_bytes == 0 {
            return Err(AppError::config("Upload payload must be at least 1 byte"));
        }

        if self.upload_payload_bytes > MAX_UPLOAD_PAYLOAD_BYTES {
            return Err(AppError::config(format!(
                "Upload payload cannot exceed {} bytes",
                MAX_UPLOAD_PAYLOAD_BYTES
            )));
        }

        if self.history_display == 0 || self.history_display > 100 {
            return Err(AppError::config("History display count must be between 1 and 100"));
        }

        if self.runs == 0 || self.runs > 50 {
            return Err(AppError::config("Run count must be between 1 and 50"));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(server) = std::env::var("SPEEDTEST_SERVER") {
            self.server = server.trim().to_lowercase();
        }

        if let Ok(default_server) = std::env::var("DEFAULT_SERVER") {
            self.default_server = default_server.trim().to_lowercase();
        }

        if let Ok(value) = std::env::var("PROBE_TIMEOUT_MS") {
            self.probe_timeout_ms = value.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid PROBE_TIMEOUT_MS value '{}': {}", value, e)))?;
        }

        if let Ok(value) = std::env::var("TRANSFER_TIMEOUT_SECONDS") {
            self.transfer_timeout_seconds = value.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid TRANSFER_TIMEOUT_SECONDS value '{}': {}", value, e)))?;
        }

        if let Ok(value) = std::env::var("UPLOAD_PAYLOAD_BYTES") {
            self.upload_payload_bytes = crate::cli::parse_size(&value)
                .map_err(|e| AppError::config(format!("Invalid UPLOAD_PAYLOAD_BYTES value '{}': {}", value, e)))?;
        }

        if let Ok(value) = std::env::var("HISTORY_DISPLAY") {
            self.history_display = value.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid HISTORY_DISPLAY value '{}': {}", value, e)))?;
        }

        if let Ok(value) = std::env::var("RUN_COUNT") {
            self.runs = value.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid RUN_COUNT value '{}': {}", value, e)))?;
        }

        if let Ok(value) = std::env::var("ENABLE_COLOR") {
            self.enable_color = value.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
        }

        Ok(())
    }
}

// Default value functions for serde
fn default_server() -> String {
    crate::defaults::AUTO_SERVER_ID.to_string()
}

fn default_default_server() -> String {
    crate::defaults::DEFAULT_SERVER_ID.to_string()
}

fn default_probe_timeout_ms() -> u64 {
    crate::defaults::DEFAULT_PROBE_TIMEOUT.as_millis() as u64
}

fn default_transfer_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_TRANSFER_TIMEOUT.as_secs()
}

fn default_upload_payload_bytes() -> u64 {
    crate::defaults::DEFAULT_UPLOAD_PAYLOAD_BYTES
}

fn default_history_display() -> usize {
    crate::defaults::DEFAULT_HISTORY_DISPLAY
}

fn default_runs() -> u32 {
    crate::defaults::DEFAULT_RUN_COUNT
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
