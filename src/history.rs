//! In-process store of completed speed tests

use crate::error::Result;
use crate::models::TestResult;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Append-only list of completed results, oldest first
///
/// Clones share the same underlying list. The engine is the only writer.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    entries: Arc<RwLock<Vec<TestResult>>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed result and return the new length
    pub async fn append(&self, result: TestResult) -> usize {
        let mut entries = self.entries.write().await;
        entries.push(result);
        entries.len()
    }

    /// The last `n` results, most recent last
    pub async fn recent(&self, n: usize) -> Vec<TestResult> {
        let entries = self.entries.read().await;
        let start = entries.len().saturating_sub(n);
        entries[start..].to_vec()
    }

    pub async fn all(&self) -> Vec<TestResult> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Serialize the whole history as a JSON array
    pub async fn to_json(&self) -> Result<String> {
        let entries = self.entries.read().await;
        Ok(serde_json::to_string_pretty(&*entries)?)
    }
}
