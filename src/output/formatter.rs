//! Core formatting traits and implementations
//!
//! This module defines the output formatting interface and provides
//! a plain text implementation with table formatting capabilities.

use crate::{
    error::{AppError, Result},
    models::{ProgressEvent, TestResult},
    registry::ServerRegistry,
};
use std::fmt::Write as _;

/// Main trait for output formatting
pub trait OutputFormatter: Send + Sync {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// Format one progress line, e.g. `[latency] 40%`
    fn format_progress(&self, event: &ProgressEvent) -> Result<String>;

    /// Format the result block of one completed run
    fn format_result(&self, result: &TestResult) -> Result<String>;

    /// Format recent runs as a table, oldest first
    fn format_history(&self, history: &[TestResult]) -> Result<String>;

    /// Format the servers a run can target
    fn format_server_list(&self, registry: &ServerRegistry) -> Result<String>;

    /// Format warning messages
    fn format_warning(&self, warning: &str) -> Result<String>;

    /// Format success messages
    fn format_success(&self, message: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// Show run identifiers and transfer details
    pub verbose_mode: bool,
    /// Show table borders
    pub table_borders: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
            table_borders: true,
        }
    }
}

/// Table formatting configuration
#[derive(Debug, Clone)]
pub struct TableFormat {
    pub columns: Vec<Column>,
    pub show_borders: bool,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub alignment: Alignment,
    pub min_width: usize,
}

impl Column {
    pub fn left(header: &str) -> Self {
        Self {
            header: header.to_string(),
            alignment: Alignment::Left,
            min_width: header.len(),
        }
    }

    pub fn right(header: &str) -> Self {
        Self {
            header: header.to_string(),
            alignment: Alignment::Right,
            min_width: header.len(),
        }
    }
}

/// Text alignment options
#[derive(Debug, Clone)]
pub enum Alignment {
    Left,
    Right,
}

/// Row data for table formatting
pub type RowData = Vec<String>;

/// History table layout shared by the formatters
pub(crate) fn history_table(show_borders: bool) -> TableFormat {
    TableFormat {
        columns: vec![
            Column::right("#"),
            Column::left("Time (UTC)"),
            Column::left("Server"),
            Column::right("Download"),
            Column::right("Upload"),
            Column::right("Latency"),
            Column::right("Jitter"),
        ],
        show_borders,
    }
}

pub(crate) fn history_rows(history: &[TestResult]) -> Vec<RowData> {
    history
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            vec![
                (index + 1).to_string(),
                entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                entry.server_name.clone(),
                format_rate(entry.download_mbps),
                format_rate(entry.upload_mbps),
                format!("{} ms", entry.latency_ms),
                format!("{} ms", entry.jitter_ms),
            ]
        })
        .collect()
}

pub(crate) fn format_rate(rate_mbps: f64) -> String {
    format!("{:.2} MB/s", rate_mbps)
}

/// Percentage with no decimals when whole, one otherwise
pub(crate) fn format_percentage(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}%", value)
    } else {
        format!("{:.1}%", value)
    }
}

/// Plain progress line shared by the formatters
pub(crate) fn progress_text(event: &ProgressEvent) -> String {
    if event.indeterminate {
        format!("[{}] receiving (size unknown)", event.phase)
    } else {
        format!("[{}] {}", event.phase, format_percentage(event.value))
    }
}

fn fmt_err(context: &str) -> impl Fn(std::fmt::Error) -> AppError + '_ {
    move |e| AppError::io(format!("Failed to format {}: {}", context, e))
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    /// Create a new plain formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    /// Create a table with the given format and data
    pub(crate) fn create_table(&self, format: &TableFormat, rows: &[RowData]) -> String {
        if rows.is_empty() {
            return String::new();
        }

        let column_widths = self.calculate_column_widths(format, rows);
        let mut output = String::new();

        if format.show_borders {
            output.push_str(&self.create_horizontal_border(&column_widths));
            output.push('\n');
        }

        let headers: Vec<String> = format.columns.iter().map(|c| c.header.clone()).collect();
        output.push_str(&self.create_row(&headers, &column_widths, format));
        output.push('\n');

        if format.show_borders {
            output.push_str(&self.create_horizontal_border(&column_widths));
            output.push('\n');
        }

        for row in rows {
            output.push_str(&self.create_row(row, &column_widths, format));
            output.push('\n');
        }

        if format.show_borders {
            output.push_str(&self.create_horizontal_border(&column_widths));
        }

        output.trim_end().to_string()
    }

    fn calculate_column_widths(&self, format: &TableFormat, rows: &[RowData]) -> Vec<usize> {
        format
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                rows.iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .fold(column.min_width.max(column.header.len()), usize::max)
            })
            .collect()
    }

    fn create_row(&self, data: &[String], widths: &[usize], format: &TableFormat) -> String {
        let mut row = String::new();

        if format.show_borders {
            row.push('|');
        }

        for (idx, (cell, &width)) in data.iter().zip(widths.iter()).enumerate() {
            let alignment = format
                .columns
                .get(idx)
                .map(|c| &c.alignment)
                .unwrap_or(&Alignment::Left);

            if format.show_borders {
                row.push(' ');
            }
            row.push_str(&self.align_text(cell, width, alignment));
            if format.show_borders {
                row.push_str(" |");
            } else {
                row.push_str("  ");
            }
        }

        row.trim_end().to_string()
    }

    fn create_horizontal_border(&self, widths: &[usize]) -> String {
        let mut border = String::from("+");
        for &width in widths {
            border.push_str(&"-".repeat(width + 2));
            border.push('+');
        }
        border
    }

    fn align_text(&self, text: &str, width: usize, alignment: &Alignment) -> String {
        let len = text.chars().count();
        if len >= width {
            return text.to_string();
        }

        let padding = " ".repeat(width - len);
        match alignment {
            Alignment::Left => format!("{}{}", text, padding),
            Alignment::Right => format!("{}{}", padding, text),
        }
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.len() + 4);
        let on_err = fmt_err("header");

        writeln!(output, "{}", border).map_err(&on_err)?;
        writeln!(output, "  {}  ", title).map_err(&on_err)?;
        write!(output, "{}", border).map_err(&on_err)?;

        Ok(output)
    }

    fn format_progress(&self, event: &ProgressEvent) -> Result<String> {
        Ok(progress_text(event))
    }

    fn format_result(&self, result: &TestResult) -> Result<String> {
        let mut output = String::new();
        let on_err = fmt_err("result");

        writeln!(output, "Server:    {}", result.server_name).map_err(&on_err)?;
        writeln!(output, "Download:  {}", format_rate(result.download_mbps)).map_err(&on_err)?;
        writeln!(output, "Upload:    {}", format_rate(result.upload_mbps)).map_err(&on_err)?;
        writeln!(output, "Latency:   {} ms", result.latency_ms).map_err(&on_err)?;
        writeln!(output, "Jitter:    {} ms", result.jitter_ms).map_err(&on_err)?;
        write!(output, "Time:      {}", result.timestamp.format("%Y-%m-%d %H:%M:%S UTC")).map_err(&on_err)?;
        if self.options.verbose_mode {
            write!(output, "\nRun ID:    {}", result.run_id).map_err(&on_err)?;
        }

        Ok(output)
    }

    fn format_history(&self, history: &[TestResult]) -> Result<String> {
        if history.is_empty() {
            return Ok("No completed tests yet.".to_string());
        }

        let table = self.create_table(&history_table(self.options.table_borders), &history_rows(history));
        Ok(format!("Recent tests ({}):\n{}", history.len(), table))
    }

    fn format_server_list(&self, registry: &ServerRegistry) -> Result<String> {
        let format = TableFormat {
            columns: vec![Column::left("ID"), Column::left("Name"), Column::left("Location")],
            show_borders: self.options.table_borders,
        };

        let mut rows: Vec<RowData> = vec![vec![
            "auto".to_string(),
            format!("Default server ({})", registry.default_id()),
            "-".to_string(),
        ]];
        rows.extend(
            registry
                .list()
                .iter()
                .map(|p| vec![p.id.clone(), p.name.clone(), p.location.clone()]),
        );

        Ok(self.create_table(&format, &rows))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("WARNING: {}", warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(message.to_string())
    }
}
