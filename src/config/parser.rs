//! Configuration parsing from CLI arguments and environment variables

use crate::{cli::Cli, config::env::EnvManager, error::Result, models::Config};
use tracing::debug;

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Build the configuration: defaults, then .env, then environment, then CLI
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        EnvManager::load_env_file(self.cli.env_file.as_deref())?;
        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);

        config.validate()?;
        Ok(config)
    }

    /// Apply the flags the user actually passed
    pub fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if let Some(server) = &cli.server {
            config.server = server.trim().to_lowercase();
        }
        if let Some(default_server) = &cli.default_server {
            config.default_server = default_server.trim().to_lowercase();
        }
        if let Some(probe_timeout) = cli.probe_timeout {
            config.probe_timeout_ms = probe_timeout;
        }
        if let Some(transfer_timeout) = cli.transfer_timeout {
            config.transfer_timeout_seconds = transfer_timeout;
        }
        if let Some(upload_size) = cli.upload_size {
            config.upload_payload_bytes = upload_size;
        }
        if let Some(history) = cli.history {
            config.history_display = history;
        }
        if let Some(runs) = cli.runs {
            config.runs = runs;
        }
        if let Some(color) = cli.color_override() {
            config.enable_color = color;
        }

        // CLI-only switches
        config.verbose = cli.verbose;
        config.debug = cli.debug;
        config.json = cli.json;

        debug!(
            server = %config.server,
            runs = config.runs,
            probe_timeout_ms = config.probe_timeout_ms,
            transfer_timeout_seconds = config.transfer_timeout_seconds,
            "applied CLI overrides"
        );
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Human-readable configuration summary for verbose output
pub fn display_config_summary(config: &Config) -> String {
    [
        format!("Server: {} (auto = {})", config.server, config.default_server),
        format!("Probe Timeout: {}ms", config.probe_timeout_ms),
        format!("Transfer Timeout: {}s", config.transfer_timeout_seconds),
        format!("Upload Payload: {} bytes", config.upload_payload_bytes),
        format!("Runs: {}", config.runs),
        format!("History Shown: {}", config.history_display),
        format!("Color Output: {}", config.enable_color),
        format!("Verbose: {}", config.verbose),
        format!("Debug: {}", config.debug),
    ]
    .join("\n")
}
