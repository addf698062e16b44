//! Error handling for the network speed tester

use thiserror::Error;

/// Custom error types for the network speed tester
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested server identifier is not in the registry
    #[error("Unknown server '{0}'")]
    UnknownServer(String),

    /// A run was requested while another one is still in progress
    #[error("A speed test is already running (phase: {0})")]
    RunInProgress(String),

    /// A single latency probe did not complete; absorbed by the latency phase
    #[error("Probe failed: {0}")]
    Probe(String),

    /// Download phase failed; fatal for the run
    #[error("Download failed: {0}")]
    Download(String),

    /// Upload phase failed; fatal for the run
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Network connectivity errors
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// The run was cancelled by the user
    #[error("Speed test cancelled")]
    Cancelled,

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (URLs, JSON, etc.)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new unknown server error
    pub fn unknown_server<S: Into<String>>(server_id: S) -> Self {
        Self::UnknownServer(server_id.into())
    }

    /// Create a new run-in-progress error
    pub fn run_in_progress<S: Into<String>>(phase: S) -> Self {
        Self::RunInProgress(phase.into())
    }

    /// Create a new probe failure
    pub fn probe<S: Into<String>>(message: S) -> Self {
        Self::Probe(message.into())
    }

    /// Create a new download error
    pub fn download<S: Into<String>>(message: S) -> Self {
        Self::Download(message.into())
    }

    /// Create a new upload error
    pub fn upload<S: Into<String>>(message: S) -> Self {
        Self::Upload(message.into())
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::UnknownServer(_) => "SERVER",
            Self::RunInProgress(_) => "BUSY",
            Self::Probe(_) => "PROBE",
            Self::Download(_) => "DOWNLOAD",
            Self::Upload(_) => "UPLOAD",
            Self::Network(_) => "NETWORK",
            Self::Timeout(_) => "TIMEOUT",
            Self::Cancelled => "CANCELLED",
            Self::Validation(_) => "VALIDATION",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Check if error is recoverable (the user can simply try again)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::Probe(_) => true,
            Self::Download(_) | Self::Upload(_) | Self::RunInProgress(_) | Self::Cancelled => true,
            Self::Config(_) | Self::UnknownServer(_) | Self::Validation(_) | Self::Parse(_) => false,
            Self::Io(_) | Self::Internal(_) => false,
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your .env file or command line arguments.", msg)
            }
            Self::UnknownServer(id) => {
                format!("Unknown server '{}'.\n\nSuggestion: Run with --list-servers to see the available identifiers.", id)
            }
            Self::RunInProgress(phase) => {
                format!("A speed test is already running ({}).\n\nSuggestion: Wait for it to finish or cancel it first.", phase)
            }
            Self::Probe(msg) => {
                format!("Latency probe failed: {}\n\nSuggestion: The server may be slow to respond; latency figures will be degraded.", msg)
            }
            Self::Download(msg) => {
                format!("Download test failed: {}\n\nSuggestion: Check your connection or try a different server with --server.", msg)
            }
            Self::Upload(msg) => {
                format!("Upload test failed: {}\n\nSuggestion: The upload endpoint may be rejecting requests. Try a different server.", msg)
            }
            Self::Network(msg) => {
                format!("Network connectivity issue: {}\n\nSuggestion: Check your internet connection and try again.", msg)
            }
            Self::Timeout(msg) => {
                format!("Request timed out: {}\n\nSuggestion: Increase --transfer-timeout or check your network connection.", msg)
            }
            Self::Cancelled => {
                "The speed test was cancelled before it finished.\n\nNo result was recorded.".to_string()
            }
            Self::Validation(msg) => {
                format!("Invalid input: {}\n\nSuggestion: Check the command line flags for conflicts or out-of-range values.", msg)
            }
            Self::Io(msg) => {
                format!("File operation failed: {}\n\nSuggestion: Check file permissions and disk space.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse data: {}\n\nSuggestion: Check the format of your input data or configuration files.", msg)
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) | Self::UnknownServer(_) => 1,
            Self::Network(_) | Self::Download(_) | Self::Upload(_) | Self::Probe(_) => 2,
            Self::Timeout(_) => 3,
            Self::RunInProgress(_) => 4,
            Self::Io(_) => 5,
            Self::Cancelled => 130,
            Self::Internal(_) => 99,
        }
    }

    /// Console color for this error's category
    fn console_color(&self) -> colored::Color {
        use colored::Color;
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) | Self::UnknownServer(_) => Color::Red,
            Self::Network(_) | Self::Download(_) | Self::Upload(_) | Self::Probe(_) => Color::Yellow,
            Self::Timeout(_) => Color::Blue,
            Self::RunInProgress(_) | Self::Cancelled => Color::Magenta,
            Self::Io(_) => Color::Cyan,
            Self::Internal(_) => Color::BrightRed,
        }
    }

    /// `[CATEGORY] message`, colored by category when `use_color` is set
    pub fn format_for_console(&self, use_color: bool) -> String {
        if !use_color {
            return format!("[{}] {}", self.category(), self);
        }

        use colored::Colorize;
        let color = self.console_color();
        format!(
            "[{}] {}",
            self.category().color(color).bold(),
            self.to_string().color(color)
        )
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else {
            Self::network(error.to_string())
        }
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error reporter for user feedback on the console
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Render an error the way `report_error` prints it
    pub fn render(&self, error: &AppError) -> String {
        let mut output = error.format_for_console(self.use_color);

        if self.verbose {
            output.push_str("\n\n");
            output.push_str(&error.user_friendly_message());

            if error.is_recoverable() {
                output.push_str("\n\n");
                let hint = "This error might be temporary. You can try running the command again.";
                if self.use_color {
                    use colored::Colorize;
                    output.push_str(&hint.green().to_string());
                } else {
                    output.push_str(hint);
                }
            }
        }

        output
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", self.render(error));
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_error = AppError::config("Invalid configuration");
        assert_eq!(config_error.category(), "CONFIG");
        assert!(!config_error.is_recoverable());
        assert_eq!(config_error.exit_code(), 1);

        let download_error = AppError::download("connection reset");
        assert_eq!(download_error.category(), "DOWNLOAD");
        assert!(download_error.is_recoverable());
        assert_eq!(download_error.exit_code(), 2);
    }

    #[test]
    fn test_phase_context_in_messages() {
        let download = AppError::download("stream interrupted").to_string();
        let upload = AppError::upload("HTTP 500").to_string();

        assert!(download.starts_with("Download failed:"));
        assert!(download.contains("stream interrupted"));
        assert!(upload.starts_with("Upload failed:"));
        assert!(upload.contains("HTTP 500"));
    }

    #[test]
    fn test_error_categories() {
        let errors = [
            AppError::config("config"),
            AppError::unknown_server("mars"),
            AppError::run_in_progress("latency"),
            AppError::probe("probe"),
            AppError::download("download"),
            AppError::upload("upload"),
            AppError::network("network"),
            AppError::timeout("timeout"),
            AppError::Cancelled,
            AppError::validation("validation"),
            AppError::io("io"),
            AppError::parse("parse"),
            AppError::internal("internal"),
        ];

        let expected_categories = [
            "CONFIG", "SERVER", "BUSY", "PROBE", "DOWNLOAD", "UPLOAD", "NETWORK",
            "TIMEOUT", "CANCELLED", "VALIDATION", "IO", "PARSE", "INTERNAL",
        ];

        for (error, expected) in errors.iter().zip(expected_categories.iter()) {
            assert_eq!(error.category(), *expected);
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::config("test").exit_code(), 1);
        assert_eq!(AppError::unknown_server("test").exit_code(), 1);
        assert_eq!(AppError::download("test").exit_code(), 2);
        assert_eq!(AppError::timeout("test").exit_code(), 3);
        assert_eq!(AppError::run_in_progress("test").exit_code(), 4);
        assert_eq!(AppError::io("test").exit_code(), 5);
        assert_eq!(AppError::Cancelled.exit_code(), 130);
        assert_eq!(AppError::internal("test").exit_code(), 99);
    }

    #[test]
    fn test_user_friendly_messages() {
        let error = AppError::unknown_server("mars");
        let message = error.user_friendly_message();
        assert!(message.contains("mars"));
        assert!(message.contains("--list-servers"));
    }

    #[test]
    fn test_error_conversions() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let app_error: AppError = io_error.into();
        assert_eq!(app_error.category(), "IO");

        let parse_error = "not_a_number".parse::<i32>().unwrap_err();
        let app_error: AppError = parse_error.into();
        assert_eq!(app_error.category(), "PARSE");
    }

    #[test]
    fn test_url_parse_error_conversion() {
        let url_error = url::Url::parse("not-a-valid-url").unwrap_err();
        let app_error: AppError = url_error.into();
        assert_eq!(app_error.category(), "PARSE");
        assert!(app_error.to_string().contains("URL parse error"));
    }

    #[test]
    fn test_dotenv_error_conversion() {
        let dotenv_error = dotenv::Error::LineParse(".env".to_string(), 1);
        let app_error: AppError = dotenv_error.into();
        assert_eq!(app_error.category(), "CONFIG");
        assert!(app_error.to_string().contains("Environment file error"));
    }

    #[test]
    fn test_console_formatting() {
        let error = AppError::upload("HTTP 503");
        let plain = error.format_for_console(false);
        let colored = error.format_for_console(true);

        assert_eq!(plain, "[UPLOAD] Upload failed: HTTP 503");
        assert!(colored.contains("UPLOAD"));
        assert!(colored.contains("HTTP 503"));
    }

    #[test]
    fn test_error_reporter_render() {
        let reporter = ErrorReporter::new(false, true);
        let rendered = reporter.render(&AppError::download("reset by peer"));

        assert!(rendered.starts_with("[DOWNLOAD]"));
        assert!(rendered.contains("Suggestion:"));
        assert!(rendered.contains("might be temporary"));

        let terse = ErrorReporter::new(false, false).render(&AppError::config("bad"));
        assert_eq!(terse, "[CONFIG] Configuration error: bad");
    }

    #[test]
    fn test_error_reporter_default() {
        let reporter = ErrorReporter::default();
        assert!(reporter.use_color);
        assert!(!reporter.verbose);
    }
}
