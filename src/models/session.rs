//! Session state owned by the speed test engine

use crate::models::{LatencyResult, ProgressEvent, ThroughputResult};
use crate::types::{Direction, SessionPhase};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot of the engine's current run
///
/// Only the engine mutates this; callers receive clones via
/// [`SpeedTestEngine::state`](crate::engine::SpeedTestEngine::state).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: SessionPhase,

    /// Message of the last fatal error, cleared when a new run starts
    pub error: Option<String>,

    pub progress: ProgressEvent,

    pub latency: Option<LatencyResult>,
    pub download: Option<ThroughputResult>,
    pub upload: Option<ThroughputResult>,

    /// Server of the current or last run
    pub server_id: Option<String>,

    /// Identifier of the current or last run
    pub run_id: Option<Uuid>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Fresh idle state
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            error: None,
            progress: ProgressEvent::none(),
            latency: None,
            download: None,
            upload: None,
            server_id: None,
            run_id: None,
        }
    }

    /// Start a new run: clears previous results and enters the latency phase
    pub fn begin_run(&mut self, server_id: &str, run_id: Uuid) {
        *self = Self::new();
        self.server_id = Some(server_id.to_string());
        self.run_id = Some(run_id);
        self.enter(SessionPhase::Latency);
    }

    /// Move to another phase and reset progress to 0 for it
    pub fn enter(&mut self, phase: SessionPhase) {
        self.phase = phase;
        self.progress = ProgressEvent::started(phase.progress_phase());
    }

    /// Record a progress event for the running phase
    ///
    /// Returns false (and leaves the state untouched) if the event belongs to
    /// another phase or would move progress backwards.
    pub fn record_progress(&mut self, event: ProgressEvent) -> bool {
        if event.phase != self.phase.progress_phase() {
            return false;
        }
        if event.phase == self.progress.phase && event.value < self.progress.value {
            return false;
        }
        self.progress = event;
        true
    }

    pub fn record_latency(&mut self, result: LatencyResult) {
        self.latency = Some(result);
    }

    pub fn record_throughput(&mut self, result: ThroughputResult) {
        match result.direction {
            Direction::Download => self.download = Some(result),
            Direction::Upload => self.upload = Some(result),
        }
    }

    /// Finish the run successfully
    pub fn complete(&mut self) {
        self.phase = SessionPhase::Complete;
        self.progress = ProgressEvent::none();
    }

    /// Abort the run with a user-visible message
    pub fn fail(&mut self, message: String) {
        self.phase = SessionPhase::Error;
        self.error = Some(message);
    }

    /// Abandon the run after a user cancel; no error is recorded
    pub fn cancel(&mut self) {
        self.phase = SessionPhase::Idle;
        self.progress = ProgressEvent::none();
    }

    pub fn is_running(&self) -> bool {
        self.phase.is_running()
    }
}
