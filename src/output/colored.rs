//! Colored formatter implementation with terminal color support
//!
//! Rates and latencies are colored by how good they are; tables reuse the
//! plain layout with a highlighted header.

use super::formatter::{
    format_percentage, format_rate, history_rows, history_table, FormattingOptions, OutputFormatter,
    PlainFormatter,
};
use crate::{
    error::Result,
    models::{ProgressEvent, TestResult},
    registry::ServerRegistry,
};
use colored::*;

/// Quality classification used for color coding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceLevel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl PerformanceLevel {
    /// Classify a round-trip latency in milliseconds
    pub fn from_latency(latency_ms: u64) -> Self {
        match latency_ms {
            0..=29 => Self::Excellent,
            30..=79 => Self::Good,
            80..=199 => Self::Fair,
            _ => Self::Poor,
        }
    }

    /// Classify a transfer rate in MB/s
    pub fn from_rate(rate_mbps: f64) -> Self {
        if rate_mbps >= 50.0 {
            Self::Excellent
        } else if rate_mbps >= 10.0 {
            Self::Good
        } else if rate_mbps >= 1.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Excellent => Color::Green,
            Self::Good => Color::Cyan,
            Self::Fair => Color::Yellow,
            Self::Poor => Color::Red,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub phase: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            phase: Color::Cyan,
            muted: Color::BrightBlack,
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    plain_formatter: PlainFormatter,
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    /// Create a new colored formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self::with_color_scheme(options, ColorScheme::default())
    }

    /// Create a colored formatter with custom color scheme
    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        Self {
            plain_formatter: PlainFormatter::new(options.clone()),
            options,
            color_scheme,
        }
    }

    /// Apply color to text if colors are enabled
    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn bold(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.bold()
        } else {
            text.normal()
        }
    }

    fn rate(&self, rate_mbps: f64) -> ColoredString {
        self.colorize(&format_rate(rate_mbps), PerformanceLevel::from_rate(rate_mbps).color())
    }

    fn latency(&self, latency_ms: u64) -> ColoredString {
        self.colorize(&format!("{} ms", latency_ms), PerformanceLevel::from_latency(latency_ms).color())
    }

    /// Progress bar of `width` cells for a percentage
    fn progress_bar(&self, percentage: f64, width: usize) -> String {
        let filled = ((percentage.clamp(0.0, 100.0) * width as f64) / 100.0) as usize;
        let empty = width - filled;

        if !self.options.enable_color {
            return format!("[{}{}]", "=".repeat(filled), " ".repeat(empty));
        }
        format!(
            "[{}{}]",
            "█".repeat(filled).color(self.color_scheme.success),
            "░".repeat(empty).color(self.color_scheme.muted)
        )
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let border = "═".repeat(title.chars().count() + 4);
        Ok(format!(
            "{}\n  {}  \n{}",
            self.colorize(&border, self.color_scheme.header),
            self.bold(title),
            self.colorize(&border, self.color_scheme.header)
        ))
    }

    fn format_progress(&self, event: &ProgressEvent) -> Result<String> {
        let label = self.colorize(&format!("[{}]", event.phase), self.color_scheme.phase);
        if event.indeterminate {
            return Ok(format!("{} {}", label, self.colorize("receiving (size unknown)", self.color_scheme.muted)));
        }
        Ok(format!(
            "{} {} {}",
            label,
            self.progress_bar(event.value, 20),
            format_percentage(event.value)
        ))
    }

    fn format_result(&self, result: &TestResult) -> Result<String> {
        let mut lines = vec![
            format!("{}    {}", self.bold("Server:"), result.server_name),
            format!("{}  {}", self.bold("Download:"), self.rate(result.download_mbps)),
            format!("{}    {}", self.bold("Upload:"), self.rate(result.upload_mbps)),
            format!(
                "{}   {} ({})",
                self.bold("Latency:"),
                self.latency(result.latency_ms),
                PerformanceLevel::from_latency(result.latency_ms).description()
            ),
            format!("{}    {} ms", self.bold("Jitter:"), result.jitter_ms),
            format!(
                "{}      {}",
                self.bold("Time:"),
                self.colorize(
                    &result.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                    self.color_scheme.muted
                )
            ),
        ];
        if self.options.verbose_mode {
            lines.push(format!("{}    {}", self.bold("Run ID:"), result.run_id));
        }
        Ok(lines.join("\n"))
    }

    fn format_history(&self, history: &[TestResult]) -> Result<String> {
        if history.is_empty() {
            return Ok(self.colorize("No completed tests yet.", self.color_scheme.muted).to_string());
        }

        let table = self
            .plain_formatter
            .create_table(&history_table(self.options.table_borders), &history_rows(history));
        Ok(format!(
            "{}\n{}",
            self.colorize(&format!("Recent tests ({}):", history.len()), self.color_scheme.header),
            table
        ))
    }

    fn format_server_list(&self, registry: &ServerRegistry) -> Result<String> {
        let listing = self.plain_formatter.format_server_list(registry)?;
        Ok(format!("{}\n{}", self.bold("Available servers:"), listing))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("!", self.color_scheme.warning), warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("✓", self.color_scheme.success), message))
    }
}
