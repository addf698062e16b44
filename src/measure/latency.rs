//! Latency phase: sequential HEAD probes with trimmed statistics

use super::ProgressSink;
use crate::{
    cancel::CancelToken,
    client::HttpClient,
    defaults::PROBE_COUNT,
    error::Result,
    models::{LatencyResult, ProbeSample, ProgressEvent, ServerProfile},
    stats,
    types::Phase,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Measures round-trip latency and jitter to a server
pub struct LatencyMeasurer {
    client: Arc<dyn HttpClient>,
    probe_timeout: Duration,
}

impl LatencyMeasurer {
    pub fn new(client: Arc<dyn HttpClient>, probe_timeout: Duration) -> Self {
        Self { client, probe_timeout }
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Run the fixed number of probes against the profile's probe endpoint
    ///
    /// Individual probe failures never fail the phase; they are recorded as
    /// samples equal to the probe timeout. The only error is cancellation.
    pub async fn measure(
        &self,
        profile: &ServerProfile,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<LatencyResult> {
        let mut samples = Vec::with_capacity(PROBE_COUNT);
        progress.report(ProgressEvent::started(Phase::Latency)).await;

        for index in 0..PROBE_COUNT {
            let sample = cancel.guard(async { Ok(self.probe(&profile.probe_url).await) }).await?;
            debug!(
                probe = index + 1,
                elapsed_ms = sample.elapsed_ms,
                responded = sample.responded,
                "latency probe finished"
            );
            samples.push(sample);

            progress
                .report(ProgressEvent::fraction(Phase::Latency, (index + 1) as u64, PROBE_COUNT as u64))
                .await;
        }

        let result = stats::summarize_latency(&samples);
        if result.is_degraded() {
            warn!(
                failed = result.samples_failed,
                sent = result.samples_sent,
                "latency figures include probes that did not respond"
            );
        }
        Ok(result)
    }

    /// Time one probe; a failure yields the timeout sentinel
    pub async fn probe(&self, url: &str) -> ProbeSample {
        let start = Instant::now();
        match timeout(self.probe_timeout, self.client.head(url, self.probe_timeout)).await {
            Ok(Ok(_)) => ProbeSample::responded(start.elapsed().min(self.probe_timeout)),
            Ok(Err(e)) => {
                warn!(url, error = %e, "latency probe failed");
                ProbeSample::no_response(self.probe_timeout)
            }
            Err(_) => {
                warn!(url, timeout_ms = self.probe_timeout.as_millis() as u64, "latency probe got no response in time");
                ProbeSample::no_response(self.probe_timeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::measure::RecordingSink;
    use crate::testing::{ProbeScript, ScriptedClient};

    fn profile() -> ServerProfile {
        ServerProfile::with_base_url("local", "Local", "http://127.0.0.1:9")
    }

    #[tokio::test]
    async fn test_trimmed_latency_from_probe_delays() {
        let client = ScriptedClient::new().with_probes(vec![
            ProbeScript::Respond(Duration::from_millis(10)),
            ProbeScript::Respond(Duration::from_millis(50)),
            ProbeScript::Respond(Duration::from_millis(12)),
            ProbeScript::Respond(Duration::from_millis(11)),
            ProbeScript::Respond(Duration::from_millis(200)),
        ]);
        let measurer = LatencyMeasurer::new(Arc::new(client), Duration::from_secs(2));

        let result = measurer.measure(&profile(), &RecordingSink::new(), &CancelToken::new()).await.unwrap();

        // Sleeps overshoot slightly; the trimmed set is {11, 12, 50}.
        assert!((24..=32).contains(&result.average_ms), "average was {}", result.average_ms);
        assert!((15..=20).contains(&result.jitter_ms), "jitter was {}", result.jitter_ms);
        assert_eq!(result.samples_sent, 5);
        assert_eq!(result.samples_failed, 0);
    }

    #[tokio::test]
    async fn test_failed_probes_use_timeout_sentinel() {
        let client = ScriptedClient::new().with_probes(vec![ProbeScript::Fail; 5]);
        let measurer = LatencyMeasurer::new(Arc::new(client), Duration::from_millis(300));

        let result = measurer.measure(&profile(), &RecordingSink::new(), &CancelToken::new()).await.unwrap();

        assert_eq!(result.average_ms, 300);
        assert_eq!(result.jitter_ms, 0);
        assert_eq!(result.samples_failed, 5);
    }

    #[tokio::test]
    async fn test_hanging_probe_is_bounded_by_timeout() {
        let client = ScriptedClient::new().with_probes(vec![
            ProbeScript::Hang,
            ProbeScript::Respond(Duration::ZERO),
            ProbeScript::Respond(Duration::ZERO),
            ProbeScript::Respond(Duration::ZERO),
            ProbeScript::Respond(Duration::ZERO),
        ]);
        let measurer = LatencyMeasurer::new(Arc::new(client), Duration::from_millis(150));

        let start = Instant::now();
        let result = measurer.measure(&profile(), &RecordingSink::new(), &CancelToken::new()).await.unwrap();

        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(result.samples_failed, 1);
        // The hanging probe is the maximum and gets trimmed away.
        assert!(result.average_ms < 20);
    }

    #[tokio::test]
    async fn test_progress_steps_through_each_probe() {
        let client = ScriptedClient::new();
        let measurer = LatencyMeasurer::new(Arc::new(client), Duration::from_secs(1));
        let sink = RecordingSink::new();

        measurer.measure(&profile(), &sink, &CancelToken::new()).await.unwrap();

        let values: Vec<f64> = sink.events().iter().map(|e| e.value).collect();
        assert_eq!(values, vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
        assert!(sink.events().iter().all(|e| e.phase == Phase::Latency));
    }

    #[tokio::test]
    async fn test_probes_hit_probe_endpoint_with_head() {
        let client = Arc::new(ScriptedClient::new());
        let measurer = LatencyMeasurer::new(client.clone(), Duration::from_secs(1));
        let profile = profile();

        measurer.measure(&profile, &RecordingSink::new(), &CancelToken::new()).await.unwrap();

        let requests = client.requests();
        assert_eq!(requests.len(), 5);
        assert!(requests.iter().all(|(method, url)| method == "HEAD" && *url == profile.probe_url));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let measurer = LatencyMeasurer::new(Arc::new(ScriptedClient::new()), Duration::from_secs(1));
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = measurer.measure(&profile(), &RecordingSink::new(), &cancel).await;
        assert_eq!(result, Err(AppError::Cancelled));
    }

    #[tokio::test]
    async fn test_single_probe_outcomes() {
        let client = ScriptedClient::new().with_probes(vec![
            ProbeScript::Respond(Duration::from_millis(5)),
            ProbeScript::Fail,
            ProbeScript::Hang,
        ]);
        let measurer = LatencyMeasurer::new(Arc::new(client), Duration::from_millis(100));
        let url = profile().probe_url;

        let answered = measurer.probe(&url).await;
        assert!(answered.responded);
        assert!(answered.elapsed_ms < 100.0);

        let failed = measurer.probe(&url).await;
        assert_eq!(failed, ProbeSample::no_response(Duration::from_millis(100)));

        let hung = measurer.probe(&url).await;
        assert!(!hung.responded);
        assert_eq!(hung.elapsed_ms, 100.0);
    }
}
