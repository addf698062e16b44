//! Speed test orchestration
//!
//! The engine owns the session state machine
//! `idle → latency → download → upload → complete` with `error` reachable from
//! every measuring phase. It drives the measurers in order, publishes progress
//! and results on named broadcast channels and appends completed runs to the
//! history store. Only one run can be in flight at a time.

pub mod events;


pub use events::{EventChannels, EventSubscriptions};

use crate::{
    cancel::CancelToken,
    client::HttpClient,
    defaults::EVENT_CHANNEL_CAPACITY,
    error::{AppError, Result},
    history::HistoryStore,
    measure::{LatencyMeasurer, ProgressSink, ThroughputMeasurer},
    models::{Config, ProgressEvent, ServerProfile, SessionState, TestResult},
    registry::ServerRegistry,
    types::SessionPhase,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Tunables for the measurers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub probe_timeout: Duration,
    pub transfer_timeout: Duration,
    pub upload_payload_bytes: usize,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            probe_timeout: config.probe_timeout(),
            transfer_timeout: config.transfer_timeout(),
            upload_payload_bytes: config.upload_payload_bytes as usize,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Runs speed tests and publishes their progress
pub struct SpeedTestEngine {
    registry: ServerRegistry,
    latency: LatencyMeasurer,
    throughput: ThroughputMeasurer,
    upload_payload_bytes: usize,
    state: Arc<RwLock<SessionState>>,
    history: HistoryStore,
    events: EventChannels,
    /// Cancel handle of the run in flight, keyed by its run id
    active_run: Mutex<Option<(Uuid, CancelToken)>>,
}

impl SpeedTestEngine {
    /// Engine over the built-in servers, configured from `config`
    pub fn new(config: &Config, client: Arc<dyn HttpClient>) -> Result<Self> {
        let registry = ServerRegistry::builtin().with_default(&config.default_server)?;
        Ok(Self::with_registry(registry, client, EngineSettings::from_config(config)))
    }

    pub fn with_registry(registry: ServerRegistry, client: Arc<dyn HttpClient>, settings: EngineSettings) -> Self {
        Self {
            registry,
            latency: LatencyMeasurer::new(client.clone(), settings.probe_timeout),
            throughput: ThroughputMeasurer::new(client, settings.transfer_timeout),
            upload_payload_bytes: settings.upload_payload_bytes,
            state: Arc::new(RwLock::new(SessionState::new())),
            history: HistoryStore::new(),
            events: EventChannels::new(EVENT_CHANNEL_CAPACITY),
            active_run: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> EventSubscriptions {
        self.events.subscribe()
    }

    /// Snapshot of the session state
    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn registry(&self) -> &ServerRegistry {
        &self.registry
    }

    /// Cancel the run in flight; returns false if nothing is running
    pub fn cancel(&self) -> bool {
        let active = match self.active_run.lock() {
            Ok(active) => active.as_ref().map(|(_, token)| token.clone()),
            Err(_) => return false,
        };

        match active {
            Some(token) => {
                info!("cancellation requested");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Run latency, download and upload against `server_id`
    ///
    /// Fails without touching the session if the identifier is unknown or a
    /// run is already in progress. A fatal phase error moves the session to
    /// `error`; a cancel moves it back to `idle`. Either way no result is
    /// recorded.
    pub async fn start_run(&self, server_id: &str) -> Result<TestResult> {
        let profile = self.registry.resolve(server_id)?;
        let run_id = Uuid::new_v4();
        let cancel = CancelToken::new();

        {
            let mut state = self.state.write().await;
            if state.is_running() {
                debug!(requested = server_id, phase = state.phase.as_str(), "run request rejected");
                return Err(AppError::run_in_progress(state.phase.as_str()));
            }
            state.begin_run(&profile.id, run_id);
            self.set_active_run(run_id, cancel.clone());
        }
        let mut guard = RunGuard::new(self, run_id);

        let span = info_span!("speed_test", run_id = %run_id, server = %profile.id);
        let outcome = self.execute(&profile, run_id, &cancel).instrument(span.clone()).await;
        self.clear_active_run(run_id);

        let settled = self.finish(outcome).instrument(span).await;
        guard.settled = true;
        settled
    }

    /// Settle the session after `execute` returned
    async fn finish(&self, outcome: Result<TestResult>) -> Result<TestResult> {
        match outcome {
            Ok(result) => {
                let history = {
                    let mut state = self.state.write().await;
                    self.history.append(result.clone()).await;
                    state.complete();
                    self.history.all().await
                };
                info!(
                    download_mbps = result.download_mbps,
                    upload_mbps = result.upload_mbps,
                    latency_ms = result.latency_ms,
                    jitter_ms = result.jitter_ms,
                    "speed test complete"
                );
                self.events.publish_result(result.clone());
                self.events.publish_history(history);
                Ok(result)
            }
            Err(AppError::Cancelled) => {
                self.state.write().await.cancel();
                info!("speed test cancelled");
                Err(AppError::Cancelled)
            }
            Err(e) => {
                let message = e.to_string();
                self.state.write().await.fail(message.clone());
                error!(error = %message, category = e.category(), "speed test failed");
                self.events.publish_error(message);
                Err(e)
            }
        }
    }

    async fn execute(&self, profile: &ServerProfile, run_id: Uuid, cancel: &CancelToken) -> Result<TestResult> {
        let progress = SessionProgress {
            state: &self.state,
            events: &self.events,
        };

        info!(phase = "latency", url = %profile.probe_url, "phase started");
        let latency = self.latency.measure(profile, &progress, cancel).await?;
        self.advance(SessionPhase::Download, |state| state.record_latency(latency)).await?;

        info!(phase = "download", url = %profile.download_url, "phase started");
        let download = self
            .throughput
            .measure_download(&profile.download_url, &progress, cancel)
            .await?;
        self.advance(SessionPhase::Upload, |state| state.record_throughput(download)).await?;

        info!(phase = "upload", url = %profile.upload_url, bytes = self.upload_payload_bytes, "phase started");
        let upload = self
            .throughput
            .measure_upload(&profile.upload_url, self.upload_payload_bytes, &progress, cancel)
            .await?;
        self.state.write().await.record_throughput(upload);

        Ok(TestResult::from_measurements(run_id, profile, &latency, &download, &upload))
    }

    /// Record a phase result and move on to `next`
    async fn advance<F>(&self, next: SessionPhase, record: F) -> Result<()>
    where
        F: FnOnce(&mut SessionState),
    {
        let mut state = self.state.write().await;
        if !state.is_running() {
            return Err(AppError::internal(format!(
                "session left the running state before {}",
                next.as_str()
            )));
        }
        record(&mut state);
        state.enter(next);
        Ok(())
    }

    fn set_active_run(&self, run_id: Uuid, token: CancelToken) {
        if let Ok(mut active) = self.active_run.lock() {
            *active = Some((run_id, token));
        }
    }

    /// Forget the cancel handle of `run_id` unless a newer run replaced it
    fn clear_active_run(&self, run_id: Uuid) {
        if let Ok(mut active) = self.active_run.lock() {
            if matches!(active.as_ref(), Some((id, _)) if *id == run_id) {
                *active = None;
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn has_active_run(&self) -> bool {
        self.active_run.lock().map(|active| active.is_some()).unwrap_or(false)
    }
}

/// Returns the session to `idle` when a run future is dropped before it settles
///
/// Callers may drop `start_run` at any await point, e.g. from a lost
/// `select!` branch or an outer timeout.
struct RunGuard<'a> {
    engine: &'a SpeedTestEngine,
    run_id: Uuid,
    settled: bool,
}

impl<'a> RunGuard<'a> {
    fn new(engine: &'a SpeedTestEngine, run_id: Uuid) -> Self {
        Self {
            engine,
            run_id,
            settled: false,
        }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        let run_id = self.run_id;
        self.engine.clear_active_run(run_id);
        warn!(run_id = %run_id, "run dropped before it finished, returning to idle");

        match self.engine.state.try_write() {
            Ok(mut state) => abandon_run(&mut state, run_id),
            Err(_) => {
                // A reader holds the lock; reset once it is released
                let state = Arc::clone(&self.engine.state);
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        handle.spawn(async move {
                            abandon_run(&mut *state.write().await, run_id);
                        });
                    }
                    Err(_) => warn!(run_id = %run_id, "no runtime left to reset the session"),
                }
            }
        }
    }
}

fn abandon_run(state: &mut SessionState, run_id: Uuid) {
    if state.run_id == Some(run_id) && state.is_running() {
        state.cancel();
    }
}

/// Forwards measurer progress into the session and the progress channel
struct SessionProgress<'a> {
    state: &'a RwLock<SessionState>,
    events: &'a EventChannels,
}

#[async_trait]
impl<'a> ProgressSink for SessionProgress<'a> {
    async fn report(&self, event: ProgressEvent) {
        let accepted = self.state.write().await.record_progress(event);
        if accepted {
            debug!(phase = %event.phase, value = event.value, "progress");
            self.events.publish_progress(event);
        }
    }
}
