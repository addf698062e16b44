//! Download and upload phases
//!
//! Both directions time a single transfer from request start to completion.
//! Downloads are consumed chunk by chunk and only the byte count is kept;
//! uploads send one fixed-size payload and complete on the response status.

use super::ProgressSink;
use crate::{
    cancel::CancelToken,
    client::HttpClient,
    defaults::UPLOAD_FILL_BYTE,
    error::{AppError, Result},
    models::{ProgressEvent, ThroughputResult},
    types::{Direction, Phase},
};
use futures::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout_at;
use tracing::{debug, info};

/// Progress resolution for downloads, in steps per 100%
const PROGRESS_STEPS: u64 = 1000;

/// Build an upload payload of exactly `size` bytes
pub fn build_payload(size: usize) -> Vec<u8> {
    vec![UPLOAD_FILL_BYTE; size]
}

/// Tracks received bytes and turns them into download progress events
///
/// Events are quantized to 0.1% so a fast stream of small chunks does not
/// flood subscribers, and an event is only produced when the value rises.
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    total: Option<u64>,
    received: u64,
    last_step: u64,
}

impl DownloadProgress {
    /// `total` is the advertised content length, if any
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total,
            received: 0,
            last_step: 0,
        }
    }

    /// True when no total size is known
    pub fn is_indeterminate(&self) -> bool {
        self.total.is_none()
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// True once a 100% event has been produced
    pub fn is_complete(&self) -> bool {
        self.last_step >= PROGRESS_STEPS
    }

    /// Account for a chunk; returns an event if progress moved forward
    pub fn advance(&mut self, bytes: usize) -> Option<ProgressEvent> {
        self.received = self.received.saturating_add(bytes as u64);

        let total = self.total?;
        let step = if total == 0 {
            PROGRESS_STEPS
        } else {
            let done = self.received.min(total) as u128;
            (done * PROGRESS_STEPS as u128 / total as u128) as u64
        };

        if step <= self.last_step {
            return None;
        }
        self.last_step = step;
        Some(ProgressEvent::new(
            Phase::Download,
            step as f64 * 100.0 / PROGRESS_STEPS as f64,
        ))
    }

    /// True when fewer bytes arrived than the server advertised
    pub fn is_short(&self) -> bool {
        matches!(self.total, Some(total) if self.received < total)
    }
}

/// Times download and upload transfers
pub struct ThroughputMeasurer {
    client: Arc<dyn HttpClient>,
    transfer_timeout: Duration,
}

impl ThroughputMeasurer {
    pub fn new(client: Arc<dyn HttpClient>, transfer_timeout: Duration) -> Self {
        Self {
            client,
            transfer_timeout,
        }
    }

    pub fn transfer_timeout(&self) -> Duration {
        self.transfer_timeout
    }

    /// Stream the object at `url` and report the average rate
    pub async fn measure_download(
        &self,
        url: &str,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<ThroughputResult> {
        progress.report(ProgressEvent::started(Phase::Download)).await;

        let start = Instant::now();
        let deadline = tokio::time::Instant::now() + self.transfer_timeout;

        let result = cancel
            .guard(async {
                let mut stream = timeout_at(deadline, self.client.get_stream(url, self.transfer_timeout))
                    .await
                    .map_err(|_| self.timed_out())?
                    .map_err(|e| AppError::download(e.to_string()))?;

                if !stream.is_success() {
                    return Err(AppError::download(format!(
                        "server returned HTTP {}",
                        stream.status_code
                    )));
                }

                let mut tracker = DownloadProgress::new(stream.content_length);
                if tracker.is_indeterminate() {
                    progress.report(ProgressEvent::indeterminate(Phase::Download)).await;
                }

                loop {
                    let next = timeout_at(deadline, stream.chunks.next())
                        .await
                        .map_err(|_| self.timed_out())?;

                    match next {
                        Some(Ok(bytes)) => {
                            if let Some(event) = tracker.advance(bytes) {
                                debug!(progress = event.value, received = tracker.received(), "download progress");
                                progress.report(event).await;
                            }
                        }
                        Some(Err(e)) => {
                            return Err(AppError::download(format!(
                                "stream interrupted after {} bytes: {}",
                                tracker.received(),
                                e
                            )));
                        }
                        None => break,
                    }
                }

                if tracker.is_short() {
                    return Err(AppError::download(format!(
                        "stream ended after {} of {} bytes",
                        tracker.received(),
                        tracker.total().unwrap_or_default()
                    )));
                }

                if !tracker.is_complete() {
                    progress.report(ProgressEvent::finished(Phase::Download)).await;
                }
                Ok(tracker.received())
            })
            .await?;

        let measured = ThroughputResult::from_transfer(Direction::Download, result, start.elapsed());
        info!(
            bytes = measured.bytes,
            elapsed_ms = measured.elapsed.as_millis() as u64,
            rate = %measured.format_rate(),
            "download finished"
        );
        Ok(measured)
    }

    /// POST a payload of `payload_size` bytes and report the average rate
    pub async fn measure_upload(
        &self,
        url: &str,
        payload_size: usize,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<ThroughputResult> {
        let payload = build_payload(payload_size);
        progress.report(ProgressEvent::started(Phase::Upload)).await;

        let start = Instant::now();
        let response = cancel
            .guard(async {
                tokio::time::timeout(self.transfer_timeout, self.client.post(url, payload, self.transfer_timeout))
                    .await
                    .map_err(|_| AppError::upload(self.timeout_message()))?
                    .map_err(|e| AppError::upload(e.to_string()))
            })
            .await?;
        let elapsed = start.elapsed();

        if !response.is_success() {
            return Err(AppError::upload(format!(
                "server returned HTTP {}",
                response.status_code
            )));
        }

        progress.report(ProgressEvent::finished(Phase::Upload)).await;

        let measured = ThroughputResult::from_transfer(Direction::Upload, payload_size as u64, elapsed);
        info!(
            bytes = measured.bytes,
            elapsed_ms = measured.elapsed.as_millis() as u64,
            rate = %measured.format_rate(),
            "upload finished"
        );
        Ok(measured)
    }

    fn timeout_message(&self) -> String {
        format!("no completion within {}s", self.transfer_timeout.as_secs())
    }

    fn timed_out(&self) -> AppError {
        AppError::download(self.timeout_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::{NoProgress, RecordingSink};
    use crate::testing::{DownloadScript, ScriptedClient};

    const URL: &str = "http://127.0.0.1:9/download";

    fn measurer(client: ScriptedClient) -> ThroughputMeasurer {
        ThroughputMeasurer::new(Arc::new(client), Duration::from_secs(5))
    }

    #[test]
    fn test_build_payload_exact_size() {
        let payload = build_payload(1024 * 1024);
        assert_eq!(payload.len(), 1_048_576);
        assert!(payload.iter().all(|b| *b == b'0'));
        assert!(build_payload(0).is_empty());
    }

    #[test]
    fn test_download_progress_quantized_and_monotonic() {
        let mut tracker = DownloadProgress::new(Some(10_000));

        // 5 bytes is below one 0.1% step
        assert!(tracker.advance(5).is_none());
        assert_eq!(tracker.advance(5).map(|e| e.value), Some(0.1));
        assert_eq!(tracker.advance(4_990).map(|e| e.value), Some(50.0));
        assert!(tracker.advance(0).is_none());
        assert_eq!(tracker.advance(5_000).map(|e| e.value), Some(100.0));
        assert!(tracker.is_complete());
        assert!(!tracker.is_short());
    }

    #[test]
    fn test_download_progress_clamps_overrun() {
        let mut tracker = DownloadProgress::new(Some(100));
        assert_eq!(tracker.advance(250).map(|e| e.value), Some(100.0));
        assert!(tracker.advance(10).is_none());
        assert_eq!(tracker.received(), 260);
    }

    #[test]
    fn test_download_progress_without_length() {
        let mut tracker = DownloadProgress::new(None);
        assert!(tracker.is_indeterminate());
        assert!(tracker.advance(1_000).is_none());
        assert!(!tracker.is_short());
        assert_eq!(tracker.received(), 1_000);
    }

    #[tokio::test]
    async fn test_download_counts_all_chunks() {
        let client = ScriptedClient::new().with_download(DownloadScript::chunks(vec![65_536; 16]));
        let sink = RecordingSink::new();

        let result = measurer(client)
            .measure_download(URL, &sink, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(result.direction, Direction::Download);
        assert_eq!(result.bytes, 1_048_576);

        let values: Vec<f64> = sink.events().iter().map(|e| e.value).collect();
        assert_eq!(values.first(), Some(&0.0));
        assert_eq!(values.last(), Some(&100.0));
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(values.iter().filter(|v| **v == 100.0).count(), 1);
    }

    #[tokio::test]
    async fn test_download_without_length_is_indeterminate() {
        let client = ScriptedClient::new().with_download(DownloadScript::chunks(vec![1_000; 4]).without_length());
        let sink = RecordingSink::new();

        let result = measurer(client)
            .measure_download(URL, &sink, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(result.bytes, 4_000);
        let events = sink.events();
        assert!(events.iter().any(|e| e.indeterminate));
        assert_eq!(events.last().map(|e| e.value), Some(100.0));
    }

    #[tokio::test]
    async fn test_download_aborted_mid_stream() {
        let client = ScriptedClient::new().with_download(DownloadScript::chunks(vec![1_000; 10]).fail_after(3));

        let err = measurer(client)
            .measure_download(URL, &NoProgress, &CancelToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Download(_)));
        assert!(err.to_string().starts_with("Download failed"));
        assert!(err.to_string().contains("3000 bytes"));
    }

    #[tokio::test]
    async fn test_download_error_status() {
        let client = ScriptedClient::new().with_download(DownloadScript::chunks(vec![]).status(404));

        let err = measurer(client)
            .measure_download(URL, &NoProgress, &CancelToken::new())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("HTTP 404"));
    }

    #[tokio::test]
    async fn test_download_shorter_than_advertised() {
        let client = ScriptedClient::new().with_download(DownloadScript::chunks(vec![500, 500]).content_length(5_000));

        let err = measurer(client)
            .measure_download(URL, &NoProgress, &CancelToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Download(_)));
        assert!(err.to_string().contains("1000 of 5000"));
    }

    #[tokio::test]
    async fn test_download_transfer_timeout() {
        let client = ScriptedClient::new()
            .with_download(DownloadScript::chunks(vec![1_000; 10]).chunk_delay(Duration::from_millis(100)));
        let measurer = ThroughputMeasurer::new(Arc::new(client), Duration::from_millis(250));

        let err = measurer
            .measure_download(URL, &NoProgress, &CancelToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Download(_)));
    }

    #[tokio::test]
    async fn test_download_cancel_is_not_a_download_error() {
        let client = ScriptedClient::new()
            .with_download(DownloadScript::chunks(vec![1_000; 100]).chunk_delay(Duration::from_millis(50)));
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(120)).await;
            trigger.cancel();
        });

        let err = measurer(client).measure_download(URL, &NoProgress, &cancel).await.unwrap_err();
        assert_eq!(err, AppError::Cancelled);
    }

    #[tokio::test]
    async fn test_upload_sends_payload() {
        let client = Arc::new(ScriptedClient::new().with_upload_delay(Duration::from_millis(20)));
        let measurer = ThroughputMeasurer::new(client.clone(), Duration::from_secs(5));
        let sink = RecordingSink::new();

        let result = measurer
            .measure_upload("http://127.0.0.1:9/upload", 1_048_576, &sink, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(result.direction, Direction::Upload);
        assert_eq!(result.bytes, 1_048_576);
        assert!(result.rate_mbps > 0.0);
        assert_eq!(client.uploaded_bytes(), vec![1_048_576]);

        let values: Vec<f64> = sink.events().iter().map(|e| e.value).collect();
        assert_eq!(values, vec![0.0, 100.0]);
    }

    #[tokio::test]
    async fn test_upload_error_status() {
        let client = ScriptedClient::new().with_upload_status(500);

        let err = measurer(client)
            .measure_upload("http://127.0.0.1:9/upload", 1024, &NoProgress, &CancelToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Upload(_)));
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_upload_transport_failure() {
        let client = ScriptedClient::new().with_upload_failure("connection reset");

        let err = measurer(client)
            .measure_upload("http://127.0.0.1:9/upload", 1024, &NoProgress, &CancelToken::new())
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("Upload failed"));
        assert!(err.to_string().contains("connection reset"));
    }
}
