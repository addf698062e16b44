//! Data models and structures for the network speed tester

pub mod config;
pub mod metrics;
pub mod server;
pub mod session;

// Re-export main model types
pub use config::Config;
pub use metrics::{LatencyResult, ProbeSample, ProgressEvent, TestResult, ThroughputResult};
pub use server::ServerProfile;
pub use session::SessionState;
