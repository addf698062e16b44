//! Measurement phases: latency probing and timed transfers

pub mod latency;
pub mod throughput;

pub use latency::LatencyMeasurer;
pub use throughput::{build_payload, DownloadProgress, ThroughputMeasurer};

use crate::models::ProgressEvent;
use async_trait::async_trait;
use std::sync::Mutex;

/// Receiver of the progress events a measurer emits
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, event: ProgressEvent);
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

#[async_trait]
impl ProgressSink for NoProgress {
    async fn report(&self, _event: ProgressEvent) {}
}

/// Sink that keeps every event in order
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ProgressSink for RecordingSink {
    async fn report(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
