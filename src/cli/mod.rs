//! Command-line interface

use crate::config::EnvManager;
use clap::Parser;
use std::path::PathBuf;

/// Network Speed Tester - measure latency, jitter, download and upload speed
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "nst")]
#[command(version, about, long_about = None)]
#[command(after_long_help = EnvManager::display_env_help())]
pub struct Cli {
    /// Server to test against (see --list-servers); `auto` uses the default server
    #[arg(short, long, value_name = "ID")]
    pub server: Option<String>,

    /// Server that `auto` resolves to
    #[arg(long, value_name = "ID")]
    pub default_server: Option<String>,

    /// Timeout of each latency probe in milliseconds
    #[arg(long, value_name = "MS")]
    pub probe_timeout: Option<u64>,

    /// Timeout of each download or upload in seconds
    #[arg(long, value_name = "SECS", value_parser = parse_duration)]
    pub transfer_timeout: Option<u64>,

    /// Upload payload size in bytes (suffixes K and M accepted)
    #[arg(long, value_name = "BYTES", value_parser = parse_size)]
    pub upload_size: Option<u64>,

    /// Number of recent results to show in the history table
    #[arg(long, value_name = "N")]
    pub history: Option<usize>,

    /// Number of consecutive runs
    #[arg(short = 'n', long, value_name = "N")]
    pub runs: Option<u32>,

    /// Load settings from this .env file instead of ./.env
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Print results and history as one JSON document
    #[arg(long)]
    pub json: bool,

    /// List available servers and exit
    #[arg(long)]
    pub list_servers: bool,

    /// Print an example .env file and exit
    #[arg(long)]
    pub print_env_example: bool,

    /// Write an example .env file to PATH and exit
    #[arg(long, value_name = "PATH")]
    pub write_env_example: Option<PathBuf>,

    /// Show build information and exit
    #[arg(long)]
    pub version_info: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if let Some(server) = &self.server {
            if server.trim().is_empty() {
                return Err("--server cannot be empty".to_string());
            }
        }

        if self.runs == Some(0) {
            return Err("--runs must be at least 1".to_string());
        }

        if self.history == Some(0) {
            return Err("--history must be at least 1".to_string());
        }

        Ok(())
    }

    /// True when the invocation only prints information and runs no test
    pub fn is_informational(&self) -> bool {
        self.list_servers || self.print_env_example || self.write_env_example.is_some() || self.version_info
    }

    /// Explicit color choice, if any flag was given
    pub fn color_override(&self) -> Option<bool> {
        if self.color {
            Some(true)
        } else if self.no_color {
            Some(false)
        } else {
            None
        }
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        self.color_override().unwrap_or_else(supports_color)
    }
}

/// Parse duration from seconds string
fn parse_duration(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > 600 {
                Err("Duration cannot exceed 600 seconds".to_string())
            } else {
                Ok(secs)
            }
        })
}

/// Parse a byte count such as `1048576`, `512K` or `4M` (binary units)
pub fn parse_size(s: &str) -> Result<u64, String> {
    let trimmed = s.trim();
    let (digits, multiplier) = match trimmed.chars().last() {
        Some('k') | Some('K') => (&trimmed[..trimmed.len() - 1], 1024),
        Some('m') | Some('M') => (&trimmed[..trimmed.len() - 1], 1024 * 1024),
        _ => (trimmed, 1),
    };

    let value = digits
        .parse::<u64>()
        .map_err(|_| format!("Invalid size: {}", s))?;
    if value == 0 {
        return Err("Size must be greater than 0".to_string());
    }

    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("Size too large: {}", s))
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}
