//! Environment variable handling and .env file management

use crate::cli::parse_size;
use crate::error::{AppError, Result};
use crate::registry::ServerRegistry;
use std::path::Path;
use tracing::debug;

/// Default location of the optional settings file
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load `path` (or `./.env`) if it exists
    ///
    /// Values already present in the process environment win over the file.
    /// An explicitly requested file that does not exist is an error.
    pub fn load_env_file(path: Option<&Path>) -> Result<bool> {
        let (path, explicit) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_ENV_FILE), false),
        };

        if !path.exists() {
            if explicit {
                return Err(AppError::config(format!("Env file not found: {}", path.display())));
            }
            debug!("no .env file found, using defaults and CLI arguments");
            return Ok(false);
        }

        dotenv::from_path(path)
            .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "loaded settings from env file");
        Ok(true)
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# Network Speed Tester Configuration
#
# Values here are used as defaults and can be overridden by real environment
# variables and by command-line arguments.

# Server to test: auto, hetzner, cloudflare, tele2
# SPEEDTEST_SERVER=auto

# Server that "auto" resolves to
# DEFAULT_SERVER=hetzner

# Latency probe timeout in milliseconds (100-60000)
# PROBE_TIMEOUT_MS=5000

# Download/upload timeout in seconds (1-600)
# TRANSFER_TIMEOUT_SECONDS=30

# Upload payload size in bytes; K and M suffixes accepted
# UPLOAD_PAYLOAD_BYTES=1048576

# Number of recent results shown in the history table (1-100)
# HISTORY_DISPLAY=5

# Number of consecutive runs (1-50)
# RUN_COUNT=1

# Enable colored output (true/false)
# ENABLE_COLOR=true

# Log filter directive, e.g. network_speed_tester=debug
# NST_LOG=warn
"#
        .to_string()
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        std::fs::write(path, Self::create_example_env_content())
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))
    }

    /// Validate one environment variable before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "SPEEDTEST_SERVER" => {
                if !ServerRegistry::builtin().is_known(value) {
                    return Err(AppError::config(format!("Unknown SPEEDTEST_SERVER '{}'", value)));
                }
            }
            "DEFAULT_SERVER" => {
                if !ServerRegistry::builtin().is_concrete(value) {
                    return Err(AppError::config(format!("DEFAULT_SERVER must name a server, got '{}'", value)));
                }
            }
            "PROBE_TIMEOUT_MS" => {
                Self::check_range(key, value, 100, 60_000)?;
            }
            "TRANSFER_TIMEOUT_SECONDS" => {
                Self::check_range(key, value, 1, 600)?;
            }
            "UPLOAD_PAYLOAD_BYTES" => {
                let bytes = parse_size(value)
                    .map_err(|e| AppError::config(format!("Invalid UPLOAD_PAYLOAD_BYTES value '{}': {}", value, e)))?;
                if bytes > crate::models::config::MAX_UPLOAD_PAYLOAD_BYTES {
                    return Err(AppError::config(format!("UPLOAD_PAYLOAD_BYTES too large: {}", value)));
                }
            }
            "HISTORY_DISPLAY" => {
                Self::check_range(key, value, 1, 100)?;
            }
            "RUN_COUNT" => {
                Self::check_range(key, value, 1, 50)?;
            }
            "ENABLE_COLOR" => {
                value
                    .parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ => {}
        }

        Ok(())
    }

    fn check_range(key: &str, value: &str, min: u64, max: u64) -> Result<()> {
        let parsed: u64 = value
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
        if parsed < min || parsed > max {
            return Err(AppError::config(format!(
                "{} must be between {} and {}, got: {}",
                key, min, max, parsed
            )));
        }
        Ok(())
    }

    /// All supported environment variables with descriptions and examples
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("SPEEDTEST_SERVER", "Server to test", "cloudflare"),
            ("DEFAULT_SERVER", "Server that 'auto' resolves to", "hetzner"),
            ("PROBE_TIMEOUT_MS", "Latency probe timeout in ms (100-60000)", "5000"),
            ("TRANSFER_TIMEOUT_SECONDS", "Transfer timeout in seconds (1-600)", "30"),
            ("UPLOAD_PAYLOAD_BYTES", "Upload payload size in bytes", "1048576"),
            ("HISTORY_DISPLAY", "Results shown in the history table (1-100)", "5"),
            ("RUN_COUNT", "Number of consecutive runs (1-50)", "1"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::from("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<26} {}\n", var, description));
            help.push_str(&format!("  {:<26} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate every supported variable currently set
    pub fn validate_current_env() -> Vec<String> {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(name, _, _)| {
                let value = std::env::var(name).ok()?;
                Self::validate_env_var(name, &value).err().map(|e| e.to_string())
            })
            .collect()
    }

    /// Validate the `KEY=VALUE` lines of an env file without loading it
    pub fn check_env_file(path: &Path) -> Result<Vec<String>> {
        let content = std::fs::read_to_string(path)?;
        let mut warnings = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match line.split_once('=') {
                Some((key, value)) => {
                    if let Err(e) = Self::validate_env_var(key.trim(), value.trim_matches(|c| c == '"' || c == ' ')) {
                        warnings.push(format!("Line '{}': {}", line, e));
                    }
                }
                None => warnings.push(format!("Line '{}': expected KEY=VALUE", line)),
            }
        }

        Ok(warnings)
    }
}
