//! Network Speed Tester
//!
//! Measures round-trip latency and jitter to a chosen server, then sustained
//! single-stream download and upload throughput, and keeps the completed
//! results in an in-process history.

pub mod app;
pub mod cancel;
pub mod cli;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod logging;
pub mod measure;
pub mod models;
pub mod output;
pub mod registry;
pub mod stats;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use cancel::CancelToken;
pub use client::{HttpClient, NetworkClient};
pub use engine::{EventSubscriptions, SpeedTestEngine};
pub use error::{AppError, Result};
pub use history::HistoryStore;
pub use models::{
    Config, LatencyResult, ProbeSample, ProgressEvent, ServerProfile, SessionState,
    TestResult, ThroughputResult,
};
pub use registry::ServerRegistry;
pub use types::{Direction, Phase, SessionPhase};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    /// Latency probes per run; the trimmed mean drops one from each end
    pub const PROBE_COUNT: usize = 5;
    pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_UPLOAD_PAYLOAD_BYTES: u64 = 1024 * 1024;
    /// Byte the upload payload is filled with
    pub const UPLOAD_FILL_BYTE: u8 = b'0';
    pub const DEFAULT_HISTORY_DISPLAY: usize = 5;
    pub const DEFAULT_RUN_COUNT: u32 = 1;
    /// Pseudo-identifier that resolves to the default server
    pub const AUTO_SERVER_ID: &str = "auto";
    pub const DEFAULT_SERVER_ID: &str = "hetzner";
    pub const DEFAULT_ENABLE_COLOR: bool = true;
    pub const USER_AGENT: &str = concat!("network-speed-tester/", env!("CARGO_PKG_VERSION"));
    /// Capacity of each engine event channel
    pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
}
