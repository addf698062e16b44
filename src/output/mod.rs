//! Output formatting and display system
//!
//! Human-readable output goes through an [`OutputFormatter`]; `--json` output
//! is a single [`JsonReport`] document.

mod colored;
mod formatter;

pub use colored::{ColorScheme, ColoredFormatter, PerformanceLevel};
pub use formatter::{Alignment, Column, FormattingOptions, OutputFormatter, PlainFormatter, RowData, TableFormat};

use crate::{
    error::Result,
    models::{ProgressEvent, TestResult},
    registry::ServerRegistry,
};
use serde::{Deserialize, Serialize};

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool) -> Box<dyn OutputFormatter> {
        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
            table_borders: true,
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    /// Create a plain text formatter for scripts/logs
    pub fn create_plain_formatter() -> Box<dyn OutputFormatter> {
        Self::create_formatter(false, false)
    }
}

/// Machine-readable document printed with `--json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonReport {
    /// Results of the runs made by this invocation
    pub results: Vec<TestResult>,
    /// Most recent history entries, oldest first
    pub history: Vec<TestResult>,
}

/// Main output coordinator that handles all result display
pub struct OutputCoordinator {
    formatter: Box<dyn OutputFormatter>,
}

impl OutputCoordinator {
    pub fn new(formatter: Box<dyn OutputFormatter>) -> Self {
        Self { formatter }
    }

    pub fn formatter(&self) -> &dyn OutputFormatter {
        self.formatter.as_ref()
    }

    pub fn progress_line(&self, event: &ProgressEvent) -> Result<String> {
        self.formatter.format_progress(event)
    }

    /// Header plus result block for run `index` of `total`
    pub fn display_result(&self, result: &TestResult, index: u32, total: u32) -> Result<String> {
        let title = if total > 1 {
            format!("Speed Test Result {}/{}", index, total)
        } else {
            "Speed Test Result".to_string()
        };

        Ok(format!(
            "{}\n{}",
            self.formatter.format_header(&title)?,
            self.formatter.format_result(result)?
        ))
    }

    pub fn display_history(&self, history: &[TestResult]) -> Result<String> {
        self.formatter.format_history(history)
    }

    pub fn display_servers(&self, registry: &ServerRegistry) -> Result<String> {
        self.formatter.format_server_list(registry)
    }

    pub fn display_warning(&self, message: &str) -> Result<String> {
        self.formatter.format_warning(message)
    }

    pub fn display_success(&self, message: &str) -> Result<String> {
        self.formatter.format_success(message)
    }

    /// Render the `--json` document
    pub fn json_report(results: &[TestResult], history: &[TestResult]) -> Result<String> {
        let report = JsonReport {
            results: results.to_vec(),
            history: history.to_vec(),
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }
}
