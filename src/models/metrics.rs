//! Measurement results, progress events and history records

use crate::models::ServerProfile;
use crate::stats;
use crate::types::{Direction, Phase};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Elapsed time of a single latency probe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeSample {
    /// Round-trip time in milliseconds
    pub elapsed_ms: f64,

    /// False when the probe failed and `elapsed_ms` holds the timeout sentinel
    pub responded: bool,
}

impl ProbeSample {
    /// Sample for a probe that got a response
    pub fn responded(elapsed: Duration) -> Self {
        Self {
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
            responded: true,
        }
    }

    /// Sample for a probe that failed or timed out; records the full timeout
    pub fn no_response(timeout: Duration) -> Self {
        Self {
            elapsed_ms: timeout.as_secs_f64() * 1000.0,
            responded: false,
        }
    }

    /// Sample from a raw millisecond value
    pub fn from_millis(elapsed_ms: f64) -> Self {
        Self {
            elapsed_ms,
            responded: true,
        }
    }
}

/// Trimmed latency statistics for one latency phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyResult {
    /// Trimmed mean round-trip time, rounded to whole milliseconds
    pub average_ms: u64,

    /// Mean absolute deviation of the trimmed samples, rounded
    pub jitter_ms: u64,

    /// Probes sent
    pub samples_sent: usize,

    /// Probes that did not respond in time
    pub samples_failed: usize,
}

impl LatencyResult {
    /// True when at least one probe had to be replaced by the timeout sentinel
    pub fn is_degraded(&self) -> bool {
        self.samples_failed > 0
    }
}

/// Average rate of one full transfer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThroughputResult {
    pub direction: Direction,

    /// Megabytes (MiB) per second, rounded to two decimals
    pub rate_mbps: f64,

    /// Total bytes transferred
    pub bytes: u64,

    /// Wall-clock duration of the transfer
    pub elapsed: Duration,
}

impl ThroughputResult {
    /// Build a result from a finished transfer
    pub fn from_transfer(direction: Direction, bytes: u64, elapsed: Duration) -> Self {
        Self {
            direction,
            rate_mbps: stats::rate_mbps(bytes, elapsed),
            bytes,
            elapsed,
        }
    }

    /// Rate formatted with two decimals
    pub fn format_rate(&self) -> String {
        format!("{:.2} MB/s", self.rate_mbps)
    }
}

/// Completion of the current measurement phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub phase: Phase,

    /// Percentage in [0, 100]
    pub value: f64,

    /// Set while the total size of a download is unknown
    #[serde(default)]
    pub indeterminate: bool,
}

impl ProgressEvent {
    /// Create a progress event; the value is clamped into [0, 100]
    pub fn new(phase: Phase, value: f64) -> Self {
        let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 100.0) };
        Self {
            phase,
            value,
            indeterminate: false,
        }
    }

    /// First event of a phase
    pub fn started(phase: Phase) -> Self {
        Self::new(phase, 0.0)
    }

    /// Last event of a phase
    pub fn finished(phase: Phase) -> Self {
        Self::new(phase, 100.0)
    }

    /// Progress for a phase whose total amount of work is unknown
    pub fn indeterminate(phase: Phase) -> Self {
        Self {
            phase,
            value: 0.0,
            indeterminate: true,
        }
    }

    /// Event used while no measurement is running
    pub fn none() -> Self {
        Self::new(Phase::None, 0.0)
    }

    /// Progress of `done` out of `total`, as a percentage
    pub fn fraction(phase: Phase, done: u64, total: u64) -> Self {
        if total == 0 {
            return Self::finished(phase);
        }
        Self::new(phase, done as f64 / total as f64 * 100.0)
    }
}

impl Default for ProgressEvent {
    fn default() -> Self {
        Self::none()
    }
}

/// One completed speed test, as stored in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Unique identifier of the run that produced this result
    pub run_id: Uuid,

    /// When the run completed
    pub timestamp: DateTime<Utc>,

    /// Download rate in MB/s
    pub download_mbps: f64,

    /// Upload rate in MB/s
    pub upload_mbps: f64,

    /// Trimmed mean latency in milliseconds
    pub latency_ms: u64,

    /// Jitter in milliseconds
    pub jitter_ms: u64,

    /// Registry key of the server that was tested
    pub server_id: String,

    /// Display name of the server that was tested
    pub server_name: String,
}

impl TestResult {
    /// Assemble a history record from the three phase results
    pub fn from_measurements(
        run_id: Uuid,
        profile: &ServerProfile,
        latency: &LatencyResult,
        download: &ThroughputResult,
        upload: &ThroughputResult,
    ) -> Self {
        Self {
            run_id,
            timestamp: Utc::now(),
            download_mbps: download.rate_mbps,
            upload_mbps: upload.rate_mbps,
            latency_ms: latency.average_ms,
            jitter_ms: latency.jitter_ms,
            server_id: profile.id.clone(),
            server_name: profile.name.clone(),
        }
    }
}
