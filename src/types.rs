//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Measurement phase a progress event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No measurement is running
    None,
    Latency,
    Download,
    Upload,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::None => "none",
            Phase::Latency => "latency",
            Phase::Download => "download",
            Phase::Upload => "upload",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a throughput measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Download,
    Upload,
}

impl Direction {
    /// Progress phase tag used while measuring in this direction
    pub fn phase(&self) -> Phase {
        match self {
            Direction::Download => Phase::Download,
            Direction::Upload => Phase::Upload,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phase().as_str())
    }
}

/// Lifecycle of a speed test session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// Ready to start a run
    Idle,
    Latency,
    Download,
    Upload,
    /// Last run finished and was recorded in history
    Complete,
    /// Last run failed; the message is kept in the session state
    Error,
}

impl SessionPhase {
    /// Whether a new run may start from this phase
    pub fn accepts_run(&self) -> bool {
        matches!(self, SessionPhase::Idle | SessionPhase::Complete | SessionPhase::Error)
    }

    /// Whether a measurement is currently in flight
    pub fn is_running(&self) -> bool {
        !self.accepts_run()
    }

    /// Progress tag matching this session phase
    pub fn progress_phase(&self) -> Phase {
        match self {
            SessionPhase::Latency => Phase::Latency,
            SessionPhase::Download => Phase::Download,
            SessionPhase::Upload => Phase::Upload,
            _ => Phase::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Latency => "latency",
            SessionPhase::Download => "download",
            SessionPhase::Upload => "upload",
            SessionPhase::Complete => "complete",
            SessionPhase::Error => "error",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_phase_accepts_run() {
        assert!(SessionPhase::Idle.accepts_run());
        assert!(SessionPhase::Complete.accepts_run());
        assert!(SessionPhase::Error.accepts_run());

        assert!(SessionPhase::Latency.is_running());
        assert!(SessionPhase::Download.is_running());
        assert!(SessionPhase::Upload.is_running());
    }

    #[test]
    fn test_progress_phase_mapping() {
        assert_eq!(SessionPhase::Latency.progress_phase(), Phase::Latency);
        assert_eq!(SessionPhase::Upload.progress_phase(), Phase::Upload);
        assert_eq!(SessionPhase::Complete.progress_phase(), Phase::None);
        assert_eq!(Direction::Download.phase(), Phase::Download);
    }

    #[test]
    fn test_serde_names_are_lowercase() {
        assert_eq!(serde_json::to_string(&Phase::Latency).unwrap(), "\"latency\"");
        assert_eq!(serde_json::to_string(&SessionPhase::Error).unwrap(), "\"error\"");
        assert_eq!(Direction::Upload.to_string(), "upload");
    }
}
