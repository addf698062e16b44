//! Named event channels published by the engine

use crate::models::{ProgressEvent, TestResult};
use tokio::sync::broadcast;

/// Sending halves, owned by the engine
#[derive(Debug, Clone)]
pub struct EventChannels {
    pub progress: broadcast::Sender<ProgressEvent>,
    pub errors: broadcast::Sender<String>,
    pub results: broadcast::Sender<TestResult>,
    pub history: broadcast::Sender<Vec<TestResult>>,
}

impl EventChannels {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            progress: broadcast::channel(capacity).0,
            errors: broadcast::channel(capacity).0,
            results: broadcast::channel(capacity).0,
            history: broadcast::channel(capacity).0,
        }
    }

    pub fn subscribe(&self) -> EventSubscriptions {
        EventSubscriptions {
            progress: self.progress.subscribe(),
            errors: self.errors.subscribe(),
            results: self.results.subscribe(),
            history: self.history.subscribe(),
        }
    }

    // Sending fails only when nobody is subscribed, which is not an error.
    pub(crate) fn publish_progress(&self, event: ProgressEvent) {
        let _ = self.progress.send(event);
    }

    pub(crate) fn publish_error(&self, message: String) {
        let _ = self.errors.send(message);
    }

    pub(crate) fn publish_result(&self, result: TestResult) {
        let _ = self.results.send(result);
    }

    pub(crate) fn publish_history(&self, history: Vec<TestResult>) {
        let _ = self.history.send(history);
    }
}

/// Receiving halves handed to a subscriber
///
/// Events sent before the subscription was taken are not delivered.
#[derive(Debug)]
pub struct EventSubscriptions {
    pub progress: broadcast::Receiver<ProgressEvent>,
    pub errors: broadcast::Receiver<String>,
    pub results: broadcast::Receiver<TestResult>,
    pub history: broadcast::Receiver<Vec<TestResult>>,
}

impl EventSubscriptions {
    /// Progress events currently queued, without waiting
    pub fn drain_progress(&mut self) -> Vec<ProgressEvent> {
        drain(&mut self.progress)
    }

    /// Error messages currently queued, without waiting
    pub fn drain_errors(&mut self) -> Vec<String> {
        drain(&mut self.errors)
    }

    pub fn drain_results(&mut self) -> Vec<TestResult> {
        drain(&mut self.results)
    }
}

fn drain<T: Clone>(receiver: &mut broadcast::Receiver<T>) -> Vec<T> {
    let mut items = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(item) => items.push(item),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    items
}
